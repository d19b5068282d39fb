// ==========================================
// 尺寸检验系统 - 外部边界错误类型
// ==========================================
// 职责: 外部服务响应的结构校验失败
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("响应无法解析: {0}")]
    Malformed(String),

    #[error("响应包含未知测量点: {0}")]
    UnknownPoint(String),

    #[error("响应中测量点重复: {0}")]
    DuplicatePoint(String),

    #[error("响应缺少测量点: {0:?}")]
    MissingPoints(Vec<String>),

    #[error("响应中测量点未判定: {0}")]
    UndecidedPoint(String),

    #[error("响应总判定无效: {0}")]
    InvalidOverall(String),

    #[error("响应缺少分析说明")]
    EmptyAnalysis,
}

pub type GatewayResult<T> = Result<T, GatewayError>;
