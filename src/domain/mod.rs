// ==========================================
// 尺寸检验系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含数据访问逻辑,不含判定逻辑
// ==========================================

pub mod action_log;
pub mod measurement;
pub mod plan;
pub mod record;
pub mod session;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use measurement::{MeasurementPoint, PointSkeleton, ToleranceBand, ToleranceError};
pub use plan::{builtin_plans, MeasurementPlan, WorkStep};
pub use record::{InspectionRecord, InspectionRecordSummary};
pub use session::{ApplyOutcome, InspectionSession, SessionTicket};
pub use types::{AdjudicationPolicy, InspectionStatus, SessionSource, SessionState, VerdictSource};
