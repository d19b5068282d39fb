// ==========================================
// 尺寸检验系统 - 检验会话领域模型
// ==========================================
// 职责: 检验会话数据、会话票据 (代际标识)、异步结果应用结果
// 说明: 状态迁移见 engine::session_machine
// ==========================================

use crate::domain::measurement::MeasurementPoint;
use crate::domain::plan::WorkStep;
use crate::domain::types::{InspectionStatus, SessionSource, SessionState, VerdictSource};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SessionTicket - 会话票据
// ==========================================
// 异步调用 (提取/裁决) 发起时签发,结果回写时核对
// 会话被重置或重新获取后 generation 递增,旧票据失效
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTicket {
    pub session_id: String,
    pub generation: u64,
}

// ==========================================
// ApplyOutcome - 异步结果回写结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,        // 已应用
    StaleDiscarded, // 会话已变更,结果丢弃
}

// ==========================================
// InspectionSession - 检验会话
// ==========================================
// 单写者: 同一时刻只有一个调用方修改会话
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionSession {
    pub(crate) session_id: String,
    pub(crate) generation: u64,
    pub(crate) model: Option<String>,
    pub(crate) source: Option<SessionSource>,
    pub(crate) points: Vec<MeasurementPoint>,
    pub(crate) steps: Vec<WorkStep>,
    pub(crate) state: SessionState,
    pub(crate) overall_verdict: InspectionStatus,
    pub(crate) analysis_note: Option<String>,
    pub(crate) verdict_source: Option<VerdictSource>,
    pub(crate) completed_at: Option<NaiveDateTime>,
    pub(crate) archived: bool,
    pub(crate) archived_record_id: Option<String>,
}

impl Default for InspectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl InspectionSession {
    /// 创建空闲会话
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            generation: 0,
            model: None,
            source: None,
            points: Vec::new(),
            steps: Vec::new(),
            state: SessionState::Idle,
            overall_verdict: InspectionStatus::Pending,
            analysis_note: None,
            verdict_source: None,
            completed_at: None,
            archived: false,
            archived_record_id: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn source(&self) -> Option<SessionSource> {
        self.source
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn points(&self) -> &[MeasurementPoint] {
        &self.points
    }

    pub fn point(&self, point_id: &str) -> Option<&MeasurementPoint> {
        self.points.iter().find(|p| p.id == point_id)
    }

    pub fn steps(&self) -> &[WorkStep] {
        &self.steps
    }

    /// 某作业步骤需测量的点 (保持会话内顺序)
    pub fn points_for_step(&self, step_no: i32) -> Vec<&MeasurementPoint> {
        match self.steps.iter().find(|s| s.step == step_no) {
            Some(step) => self
                .points
                .iter()
                .filter(|p| step.point_ids.iter().any(|id| id == &p.id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// 总判定 (仅在 COMPLETED 时有意义)
    pub fn overall_verdict(&self) -> InspectionStatus {
        self.overall_verdict
    }

    pub fn analysis_note(&self) -> Option<&str> {
        self.analysis_note.as_deref()
    }

    pub fn verdict_source(&self) -> Option<VerdictSource> {
        self.verdict_source
    }

    pub fn completed_at(&self) -> Option<NaiveDateTime> {
        self.completed_at
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    pub fn archived_record_id(&self) -> Option<&str> {
        self.archived_record_id.as_deref()
    }

    /// 当前票据
    pub fn ticket(&self) -> SessionTicket {
        SessionTicket {
            session_id: self.session_id.clone(),
            generation: self.generation,
        }
    }

    /// 票据是否仍对应当前会话
    pub fn is_current(&self, ticket: &SessionTicket) -> bool {
        ticket.generation == self.generation && ticket.session_id == self.session_id
    }

    /// 未录入实测值的点
    pub fn missing_measurements(&self) -> Vec<String> {
        self.points
            .iter()
            .filter(|p| p.measured.is_none())
            .map(|p| p.id.clone())
            .collect()
    }
}
