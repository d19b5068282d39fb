// ==========================================
// 尺寸检验系统 - 应用层
// ==========================================
// 职责: 装配数据库连接、仓储、配置、流程编排与API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
