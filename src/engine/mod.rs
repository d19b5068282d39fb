// ==========================================
// 尺寸检验系统 - 引擎层
// ==========================================
// 职责: 公差判定、批次汇总、会话状态机、外部裁决对账与流程编排
// 红线: Engine 不拼 SQL, 判定必须可解释 (输出界限/偏差/原因)
// ==========================================

pub mod collaborators;
pub mod error;
pub mod reconcile;
pub mod session_machine;
pub mod tolerance;
pub mod verdict;
pub mod workflow;

// 重导出核心引擎
pub use collaborators::{
    Adjudicator, ArchivalSink, DocumentExtractor, MeasurementPlanSource, StaticPlanSource,
};
pub use error::{WorkflowError, WorkflowResult};
pub use reconcile::{Disagreement, Reconciler, ValidationReport};
pub use session_machine::ArchiveOutcome;
pub use tolerance::{ToleranceEvaluator, ToleranceOutcome};
pub use verdict::{BatchOutcome, BatchVerdict, PointVerdict, CONFORMANT_NOTE, NON_CONFORMANT_NOTE};
pub use workflow::InspectionWorkflow;
