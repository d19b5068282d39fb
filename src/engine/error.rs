// ==========================================
// 尺寸检验系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 过期结果不是错误,以 ApplyOutcome::StaleDiscarded 表示
// ==========================================

use crate::domain::measurement::ToleranceError;
use crate::domain::types::SessionState;
use thiserror::Error;

/// 检验流程错误类型
#[derive(Error, Debug)]
pub enum WorkflowError {
    // ===== 用户可修正 =====
    #[error("实测值未录入完整: missing={missing:?}")]
    IncompleteInput { missing: Vec<String> },

    #[error("测量点不存在: {0}")]
    UnknownPoint(String),

    #[error("实测值无效 (point={point_id}): {value}")]
    InvalidMeasurement { point_id: String, value: f64 },

    #[error("型号不能为空")]
    EmptyModel,

    #[error("型号未登记测量计划: {0}")]
    UnknownModel(String),

    // ===== 外部协作方 =====
    #[error("测量点提取失败: {0}")]
    ExtractionFailure(String),

    #[error("外部裁决失败: {0}")]
    AdjudicationFailure(String),

    // ===== 数据校验 =====
    #[error("测量点定义无效 (point={point_id}): {source}")]
    InvalidPoint {
        point_id: String,
        #[source]
        source: ToleranceError,
    },

    #[error("测量点ID重复: {0}")]
    DuplicatePoint(String),

    #[error("批次为空,无法判定")]
    EmptyBatch,

    #[error("存在未判定的测量点: {0:?}")]
    UndecidedPoints(Vec<String>),

    // ===== 状态机 =====
    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: SessionState, to: SessionState },

    #[error("会话尚未完成,不能归档: state={0}")]
    NotCompleted(SessionState),

    // ===== 归档 =====
    #[error("归档失败: {0}")]
    ArchiveFailure(#[source] anyhow::Error),
}

/// Result 类型别名
pub type WorkflowResult<T> = Result<T, WorkflowError>;
