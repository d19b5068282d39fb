// ==========================================
// 尺寸检验系统 - 检验会话状态机
// ==========================================
// 状态: IDLE → ACQUIRING → AWAITING_INPUT → VALIDATING → COMPLETED
// 规则:
// - 任意状态可重新获取 (选型号/提交文档) 或清空回 IDLE
// - AWAITING_INPUT 录入实测值不触发判定
// - 实测值不完整时拒绝进入 VALIDATING,状态不变
// - 异步结果凭票据回写,过期票据的结果丢弃
// - COMPLETED 为终态,只能归档一次
// ==========================================

use crate::domain::measurement::{MeasurementPoint, PointSkeleton};
use crate::domain::plan::WorkStep;
use crate::domain::record::InspectionRecord;
use crate::domain::session::{ApplyOutcome, InspectionSession, SessionTicket};
use crate::domain::types::{InspectionStatus, SessionSource, SessionState};
use crate::engine::collaborators::ArchivalSink;
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::engine::verdict::BatchOutcome;
use chrono::Utc;
use std::collections::HashSet;

/// 归档结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Archived(String),        // 新写入的记录ID
    AlreadyArchived(String), // 此前已归档的记录ID
}

impl ArchiveOutcome {
    pub fn record_id(&self) -> &str {
        match self {
            ArchiveOutcome::Archived(id) | ArchiveOutcome::AlreadyArchived(id) => id,
        }
    }
}

impl InspectionSession {
    fn require_state(&self, expected: SessionState, to: SessionState) -> WorkflowResult<()> {
        if self.state != expected {
            return Err(WorkflowError::InvalidStateTransition {
                from: self.state,
                to,
            });
        }
        Ok(())
    }

    fn reset_results(&mut self) {
        self.overall_verdict = InspectionStatus::Pending;
        self.analysis_note = None;
        self.verdict_source = None;
        self.completed_at = None;
        self.archived = false;
        self.archived_record_id = None;
    }

    // ==========================================
    // 获取测量点
    // ==========================================

    /// 开始获取测量点 (任意状态 → ACQUIRING)
    ///
    /// 新会话ID + 代际递增,之前签发的票据全部失效
    pub fn begin_acquisition(
        &mut self,
        model: &str,
        source: SessionSource,
    ) -> WorkflowResult<SessionTicket> {
        let model = model.trim();
        if model.is_empty() {
            return Err(WorkflowError::EmptyModel);
        }

        let from = self.state;
        self.session_id = uuid::Uuid::new_v4().to_string();
        self.generation += 1;
        self.model = Some(model.to_string());
        self.source = Some(source);
        self.points.clear();
        self.steps.clear();
        self.reset_results();
        self.state = SessionState::Acquiring;

        tracing::info!(
            "会话开始获取测量点: session_id={}, model={}, source={}, from={}",
            self.session_id,
            model,
            source,
            from
        );
        Ok(self.ticket())
    }

    /// 测量点到达 (ACQUIRING → AWAITING_INPUT)
    ///
    /// 空列表视为提取失败,会话停留在 ACQUIRING 可重试
    pub fn complete_acquisition(
        &mut self,
        ticket: &SessionTicket,
        skeletons: Vec<PointSkeleton>,
        steps: Vec<WorkStep>,
    ) -> WorkflowResult<ApplyOutcome> {
        if !self.is_current(ticket) {
            tracing::debug!(
                "丢弃过期的测量点结果: ticket_generation={}, current_generation={}",
                ticket.generation,
                self.generation
            );
            return Ok(ApplyOutcome::StaleDiscarded);
        }
        self.require_state(SessionState::Acquiring, SessionState::AwaitingInput)?;

        if skeletons.is_empty() {
            return Err(WorkflowError::ExtractionFailure(
                "未获得任何测量点".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for skeleton in &skeletons {
            skeleton.band().map_err(|source| WorkflowError::InvalidPoint {
                point_id: skeleton.id.clone(),
                source,
            })?;
            if !seen.insert(skeleton.id.as_str()) {
                return Err(WorkflowError::DuplicatePoint(skeleton.id.clone()));
            }
        }

        self.points = skeletons
            .into_iter()
            .map(MeasurementPoint::from_skeleton)
            .collect();
        self.steps = steps;
        self.state = SessionState::AwaitingInput;

        tracing::info!(
            "测量点已就绪: session_id={}, points={}, steps={}",
            self.session_id,
            self.points.len(),
            self.steps.len()
        );
        Ok(ApplyOutcome::Applied)
    }

    /// 放弃获取 (ACQUIRING → IDLE),用于型号未登记
    pub fn abandon_acquisition(&mut self, ticket: &SessionTicket) -> ApplyOutcome {
        if !self.is_current(ticket) || self.state != SessionState::Acquiring {
            return ApplyOutcome::StaleDiscarded;
        }
        self.clear();
        ApplyOutcome::Applied
    }

    // ==========================================
    // 录入实测值
    // ==========================================

    /// 录入/清除实测值 (AWAITING_INPUT 自循环,不触发判定)
    pub fn record_measurement(
        &mut self,
        point_id: &str,
        value: Option<f64>,
    ) -> WorkflowResult<()> {
        self.require_state(SessionState::AwaitingInput, SessionState::AwaitingInput)?;

        if let Some(v) = value {
            if !v.is_finite() {
                return Err(WorkflowError::InvalidMeasurement {
                    point_id: point_id.to_string(),
                    value: v,
                });
            }
        }

        let point = self
            .points
            .iter_mut()
            .find(|p| p.id == point_id)
            .ok_or_else(|| WorkflowError::UnknownPoint(point_id.to_string()))?;
        point.measured = value;
        Ok(())
    }

    // ==========================================
    // 判定
    // ==========================================

    /// 开始判定 (AWAITING_INPUT → VALIDATING)
    ///
    /// 有点未录入时返回 IncompleteInput,会话不变
    pub fn begin_validation(&mut self) -> WorkflowResult<SessionTicket> {
        self.require_state(SessionState::AwaitingInput, SessionState::Validating)?;

        let missing = self.missing_measurements();
        if !missing.is_empty() {
            return Err(WorkflowError::IncompleteInput { missing });
        }
        if self.points.is_empty() {
            return Err(WorkflowError::EmptyBatch);
        }

        self.state = SessionState::Validating;
        tracing::info!(
            "会话进入判定: session_id={}, points={}",
            self.session_id,
            self.points.len()
        );
        Ok(self.ticket())
    }

    /// 判定结果回写 (VALIDATING → COMPLETED)
    pub fn complete_validation(
        &mut self,
        ticket: &SessionTicket,
        outcome: &BatchOutcome,
    ) -> WorkflowResult<ApplyOutcome> {
        if !self.is_current(ticket) {
            tracing::debug!(
                "丢弃过期的判定结果: ticket_generation={}, current_generation={}",
                ticket.generation,
                self.generation
            );
            return Ok(ApplyOutcome::StaleDiscarded);
        }
        self.require_state(SessionState::Validating, SessionState::Completed)?;

        let mut statuses = Vec::with_capacity(self.points.len());
        let mut undecided = Vec::new();
        for point in &self.points {
            match outcome.status_of(&point.id) {
                Some(s) if s.is_decided() => statuses.push(s),
                _ => undecided.push(point.id.clone()),
            }
        }
        if !undecided.is_empty() {
            return Err(WorkflowError::UndecidedPoints(undecided));
        }

        for (point, status) in self.points.iter_mut().zip(statuses) {
            point.status = status;
        }
        self.overall_verdict = outcome.overall_verdict;
        self.analysis_note = Some(outcome.analysis_note.clone());
        self.verdict_source = Some(outcome.source);
        self.completed_at = Some(Utc::now().naive_utc());
        self.state = SessionState::Completed;

        tracing::info!(
            "会话判定完成: session_id={}, overall={}, source={}",
            self.session_id,
            self.overall_verdict,
            outcome.source
        );
        Ok(ApplyOutcome::Applied)
    }

    /// 放弃判定 (VALIDATING → AWAITING_INPUT),在途裁决结果随代际失效
    pub fn abort_validation(&mut self, ticket: &SessionTicket) -> WorkflowResult<ApplyOutcome> {
        if !self.is_current(ticket) {
            return Ok(ApplyOutcome::StaleDiscarded);
        }
        self.require_state(SessionState::Validating, SessionState::AwaitingInput)?;

        self.generation += 1;
        self.state = SessionState::AwaitingInput;
        tracing::info!("会话放弃判定,返回录入: session_id={}", self.session_id);
        Ok(ApplyOutcome::Applied)
    }

    // ==========================================
    // 清空 / 归档
    // ==========================================

    /// 清空型号选择 (任意状态 → IDLE,不持久化)
    pub fn clear(&mut self) {
        self.generation += 1;
        self.model = None;
        self.source = None;
        self.points.clear();
        self.steps.clear();
        self.reset_results();
        self.state = SessionState::Idle;
        tracing::info!("会话已清空: session_id={}", self.session_id);
    }

    /// 生成归档快照 (仅 COMPLETED)
    pub fn to_record(&self, archived_by: &str) -> WorkflowResult<InspectionRecord> {
        if self.state != SessionState::Completed {
            return Err(WorkflowError::NotCompleted(self.state));
        }

        let now = Utc::now().naive_utc();
        Ok(InspectionRecord {
            record_id: uuid::Uuid::new_v4().to_string(),
            session_id: self.session_id.clone(),
            model: self.model.clone().unwrap_or_default(),
            points: self.points.clone(),
            overall_verdict: self.overall_verdict,
            analysis_note: self.analysis_note.clone().unwrap_or_default(),
            verdict_source: self.verdict_source.unwrap_or_default(),
            completed_at: self.completed_at.unwrap_or(now),
            archived_at: now,
            archived_by: archived_by.to_string(),
        })
    }

    /// 归档 (幂等: 已归档时直接返回原记录ID)
    pub fn archive(
        &mut self,
        sink: &dyn ArchivalSink,
        archived_by: &str,
    ) -> WorkflowResult<ArchiveOutcome> {
        if let Some(record_id) = &self.archived_record_id {
            return Ok(ArchiveOutcome::AlreadyArchived(record_id.clone()));
        }

        let record = self.to_record(archived_by)?;
        sink.archive(&record).map_err(WorkflowError::ArchiveFailure)?;

        self.archived = true;
        self.archived_record_id = Some(record.record_id.clone());
        tracing::info!(
            "检验记录已归档: session_id={}, record_id={}",
            self.session_id,
            record.record_id
        );
        Ok(ArchiveOutcome::Archived(record.record_id))
    }
}
