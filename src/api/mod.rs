// ==========================================
// 尺寸检验系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,校验输入并记录审计日志
// ==========================================

pub mod error;
pub mod inspection_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use inspection_api::{InspectionApi, ValidationResponse};
