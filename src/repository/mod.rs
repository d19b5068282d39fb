// ==========================================
// 尺寸检验系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod inspection_repo;
pub mod plan_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inspection_repo::InspectionRecordRepository;
pub use plan_repo::MeasurementPlanRepository;

use chrono::NaiveDateTime;

/// 时间戳写入格式 (微秒精度,保证同秒内排序稳定)
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// 解析时间戳列 (兼容无小数秒的旧数据)
pub(crate) fn parse_ts(col: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
    })
}
