// ==========================================
// 尺寸检验系统 - 核心库
// ==========================================
// 业务: 尺寸检验与公差判定 (控制图测量点 → 实测值 → 合格判定 → 归档)
// 技术栈: Rust + SQLite
// 系统定位: 检验辅助系统 (本地确定性判定为底线,外部裁决可选)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 外部边界层 - 提取/裁决响应校验
pub mod gateway;

// 引擎层 - 判定规则与会话状态机
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AdjudicationPolicy, InspectionStatus, SessionSource, SessionState, VerdictSource,
};

// 领域实体
pub use domain::{
    ActionLog, ActionType, InspectionRecord, InspectionSession, MeasurementPlan,
    MeasurementPoint, PointSkeleton, ToleranceBand, WorkStep,
};

// 引擎
pub use engine::{BatchVerdict, InspectionWorkflow, ToleranceEvaluator, WorkflowError};

// API
pub use api::{ApiError, InspectionApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "尺寸检验系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
