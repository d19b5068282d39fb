// ==========================================
// 尺寸检验系统 - 外部边界层
// ==========================================
// 职责: 外部提取/裁决服务的请求构造与响应结构校验
// 红线: 畸形响应在此转换为类型化结果,不向上层泄漏原始 JSON
// ==========================================

pub mod adjudication;
pub mod error;
pub mod extraction;

pub use adjudication::{
    parse_adjudication_response, AdjudicationRequest, AdjudicationRequestPoint,
    AdjudicationVerdict,
};
pub use error::{GatewayError, GatewayResult};
pub use extraction::{parse_extraction_response, SourceDocument};
