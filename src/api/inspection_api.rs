// ==========================================
// 尺寸检验系统 - 检验会话 API
// ==========================================
// 职责: 选型号/提交文档、录入实测值、判定、归档、记录查询
// 红线:
// - 会话锁不跨 await 持有,异步结果凭票据回写
// - 归档/裁决降级/裁决分歧/参考裁决说明必须写 ActionLog
// - 审计写入失败只记 error 日志,不回滚已生效的会话状态
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::json;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::record::{InspectionRecord, InspectionRecordSummary};
use crate::domain::session::{ApplyOutcome, InspectionSession};
use crate::domain::measurement::MeasurementPoint;
use crate::domain::types::{AdjudicationPolicy, SessionSource};
use crate::engine::reconcile::ValidationReport;
use crate::engine::session_machine::ArchiveOutcome;
use crate::engine::tolerance::ToleranceEvaluator;
use crate::engine::workflow::InspectionWorkflow;
use crate::gateway::SourceDocument;
use crate::repository::{
    ActionLogRepository, InspectionRecordRepository, MeasurementPlanRepository,
};

/// 记录列表单次上限
const MAX_LIST_LIMIT: i32 = 1000;

/// 判定调用结果
#[derive(Debug, Clone)]
pub struct ValidationResponse {
    /// Applied: 结果已写入会话; StaleDiscarded: 会话已变更,结果丢弃
    pub outcome: ApplyOutcome,
    pub report: ValidationReport,
}

// ==========================================
// InspectionApi - 检验会话 API
// ==========================================
pub struct InspectionApi {
    session: Mutex<InspectionSession>,
    workflow: Arc<InspectionWorkflow>,
    plan_repo: Arc<MeasurementPlanRepository>,
    record_repo: Arc<InspectionRecordRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl InspectionApi {
    /// 创建新的 InspectionApi 实例 (会话初始为 IDLE)
    pub fn new(
        workflow: Arc<InspectionWorkflow>,
        plan_repo: Arc<MeasurementPlanRepository>,
        record_repo: Arc<InspectionRecordRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            session: Mutex::new(InspectionSession::new()),
            workflow,
            plan_repo,
            record_repo,
            action_log_repo,
        }
    }

    fn lock_session(&self) -> ApiResult<MutexGuard<'_, InspectionSession>> {
        self.session
            .lock()
            .map_err(|e| ApiError::InternalError(format!("会话锁获取失败: {}", e)))
    }

    fn require_operator(operator: &str) -> ApiResult<()> {
        if operator.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }
        Ok(())
    }

    /// 写审计日志 (失败不影响已生效的业务结果)
    fn write_audit(&self, logs: &[ActionLog]) {
        if logs.is_empty() {
            return;
        }
        if let Err(e) = self.action_log_repo.batch_insert(logs) {
            tracing::error!(
                "审计日志写入失败: action_types={:?}, error={}",
                logs.iter().map(|l| l.action_type.as_str()).collect::<Vec<_>>(),
                e
            );
        }
    }

    /// 当前会话快照
    pub fn session_snapshot(&self) -> ApiResult<InspectionSession> {
        Ok(self.lock_session()?.clone())
    }

    /// 已登记测量计划的型号
    pub fn list_models(&self) -> ApiResult<Vec<String>> {
        Ok(self.plan_repo.list_models()?)
    }

    // ==========================================
    // 获取测量点
    // ==========================================

    /// 选择型号 (按测量计划填充测量点)
    pub fn select_model(&self, model: &str) -> ApiResult<InspectionSession> {
        if model.trim().is_empty() {
            return Err(ApiError::InvalidInput("型号不能为空".to_string()));
        }

        let mut session = self.lock_session()?;
        self.workflow.select_model(&mut session, model)?;
        Ok(session.clone())
    }

    /// 清空型号选择 (会话回到 IDLE)
    pub fn clear_model(&self) -> ApiResult<()> {
        self.lock_session()?.clear();
        Ok(())
    }

    /// 提交控制图文档,提取测量点
    ///
    /// # 返回
    /// - Ok(Applied): 会话进入 AWAITING_INPUT
    /// - Ok(StaleDiscarded): 提取期间会话已变更,结果丢弃
    /// - Err(ExtractionFailed): 会话停留在 ACQUIRING,可重新提交
    pub async fn submit_document(
        &self,
        model: &str,
        document: &SourceDocument,
        operator: &str,
    ) -> ApiResult<ApplyOutcome> {
        Self::require_operator(operator)?;

        let (ticket, model) = {
            let mut session = self.lock_session()?;
            let ticket = session.begin_acquisition(model, SessionSource::Document)?;
            (ticket, session.model().map(|m| m.to_string()))
        };

        let points = match self.workflow.extract_points(document).await {
            Ok(points) => points,
            Err(e) => {
                let log = ActionLog::new(ActionType::ExtractionFailed, operator)
                    .with_session(&ticket.session_id)
                    .with_model(model.as_deref())
                    .with_payload(&json!({ "file_name": document.file_name }))
                    .with_detail(e.to_string());
                self.write_audit(&[log]);
                return Err(e.into());
            }
        };

        let outcome = self
            .lock_session()?
            .complete_acquisition(&ticket, points, Vec::new())?;
        Ok(outcome)
    }

    // ==========================================
    // 录入实测值
    // ==========================================

    /// 录入实测值 (None 清除已录入的值)
    pub fn enter_measurement(&self, point_id: &str, value: Option<f64>) -> ApiResult<()> {
        self.lock_session()?.record_measurement(point_id, value)?;
        Ok(())
    }

    /// 录入文本形式的实测值 (无法解析的文本视为未录入)
    pub fn enter_measurement_text(&self, point_id: &str, raw: &str) -> ApiResult<()> {
        self.enter_measurement(point_id, parse_measurement_text(raw))
    }

    // ==========================================
    // 判定
    // ==========================================

    /// 判定当前会话
    ///
    /// 外部裁决降级或与本地判定不一致时写审计日志
    pub async fn validate(&self, operator: &str) -> ApiResult<ValidationResponse> {
        Self::require_operator(operator)?;

        let (ticket, model, points) = {
            let mut session = self.lock_session()?;
            let ticket = session.begin_validation()?;
            (
                ticket,
                session.model().map(|m| m.to_string()),
                session.points().to_vec(),
            )
        };

        let report = match self.workflow.adjudicate_points(model.as_deref(), &points).await {
            Ok(report) => report,
            Err(e) => {
                self.lock_session()?.abort_validation(&ticket)?;
                return Err(e.into());
            }
        };

        let outcome = self
            .lock_session()?
            .complete_validation(&ticket, &report.outcome)?;

        if outcome == ApplyOutcome::Applied {
            self.write_validation_audit(&ticket.session_id, model.as_deref(), &points, &report, operator);
        } else {
            tracing::info!(
                "判定期间会话已变更,结果丢弃: session_id={}",
                ticket.session_id
            );
        }

        Ok(ValidationResponse { outcome, report })
    }

    fn write_validation_audit(
        &self,
        session_id: &str,
        model: Option<&str>,
        points: &[MeasurementPoint],
        report: &ValidationReport,
        operator: &str,
    ) {
        let mut logs = Vec::new();

        if let Some(reason) = &report.fallback_reason {
            let point_reasons: Vec<String> = points
                .iter()
                .map(|p| ToleranceEvaluator::evaluate_detailed(p).reason)
                .collect();
            logs.push(
                ActionLog::new(ActionType::AdjudicationFallback, operator)
                    .with_session(session_id)
                    .with_model(model)
                    .with_payload(&json!({
                        "reason": reason,
                        "overall_verdict": report.outcome.overall_verdict,
                        "point_reasons": point_reasons,
                    }))
                    .with_detail(format!("外部裁决不可用,采用本地判定: {}", reason)),
            );
        }

        if report.has_disagreements() || report.reported_overall_mismatch.is_some() {
            logs.push(
                ActionLog::new(ActionType::AdjudicationDisagreement, operator)
                    .with_session(session_id)
                    .with_model(model)
                    .with_payload(&json!({
                        "policy": report.policy,
                        "disagreements": report.disagreements,
                        "reported_overall_mismatch": report.reported_overall_mismatch,
                        "adjudicator_analysis": report.adjudicator_analysis,
                        "final_overall_verdict": report.outcome.overall_verdict,
                    }))
                    .with_detail(format!(
                        "外部裁决与本地判定不一致: {} 个测量点",
                        report.disagreements.len()
                    )),
            );
        }

        // ADVISORY: 裁决说明不进入检验记录,在审计日志中留存
        if report.policy == AdjudicationPolicy::Advisory {
            if let Some(analysis) = &report.adjudicator_analysis {
                logs.push(
                    ActionLog::new(ActionType::AdjudicationAdvisory, operator)
                        .with_session(session_id)
                        .with_model(model)
                        .with_payload(&json!({
                            "adjudicator_analysis": analysis,
                            "agrees_with_local": !report.has_disagreements(),
                            "final_overall_verdict": report.outcome.overall_verdict,
                        }))
                        .with_detail(analysis.clone()),
                );
            }
        }

        self.write_audit(&logs);
    }

    // ==========================================
    // 归档
    // ==========================================

    /// 归档已完成的会话 (幂等)
    pub fn archive(&self, operator: &str) -> ApiResult<ArchiveOutcome> {
        Self::require_operator(operator)?;

        let mut session = self.lock_session()?;
        let outcome = session.archive(self.record_repo.as_ref(), operator.trim())?;

        if let ArchiveOutcome::Archived(record_id) = &outcome {
            let log = ActionLog::new(ActionType::InspectionArchived, operator)
                .with_session(session.session_id())
                .with_record(record_id)
                .with_model(session.model())
                .with_payload(&json!({
                    "overall_verdict": session.overall_verdict(),
                    "verdict_source": session.verdict_source(),
                    "point_count": session.points().len(),
                }))
                .with_detail(format!("检验记录归档: {}", record_id));
            self.write_audit(&[log]);
        }

        Ok(outcome)
    }

    // ==========================================
    // 记录查询
    // ==========================================

    /// 检验记录摘要列表
    pub fn list_records(
        &self,
        model: Option<&str>,
        limit: i32,
    ) -> ApiResult<Vec<InspectionRecordSummary>> {
        if limit <= 0 || limit > MAX_LIST_LIMIT {
            return Err(ApiError::InvalidInput(format!(
                "limit必须在1-{}之间",
                MAX_LIST_LIMIT
            )));
        }
        let model = model.map(str::trim).filter(|m| !m.is_empty());
        Ok(self.record_repo.list_summaries(model, limit)?)
    }

    /// 按ID读取检验记录
    pub fn get_record(&self, record_id: &str) -> ApiResult<InspectionRecord> {
        self.record_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("检验记录(id={})不存在", record_id)))
    }

    /// 会话审计轨迹
    pub fn get_audit_trail(&self, session_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_session_id(session_id)?)
    }
}

/// 解析文本实测值
///
/// - 仅含逗号时逗号视为小数点 ("450,8")
/// - 同时含逗号和点时逗号视为千分位 ("1,234.5")
/// - 无法解析或非有限值 (NaN / inf) → None
pub(crate) fn parse_measurement_text(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let normalized = if trimmed.contains('.') {
        trimmed.replace(',', "")
    } else {
        trimmed.replace(',', ".")
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_measurement_text() {
        assert_eq!(parse_measurement_text(" 450,8 "), Some(450.8));
        assert_eq!(parse_measurement_text("450.8"), Some(450.8));
        assert_eq!(parse_measurement_text("1,234.5"), Some(1234.5));
        assert_eq!(parse_measurement_text("-0.25"), Some(-0.25));
    }

    #[test]
    fn test_parse_measurement_text_rejects_non_finite() {
        assert_eq!(parse_measurement_text("NaN"), None);
        assert_eq!(parse_measurement_text("inf"), None);
        assert_eq!(parse_measurement_text("-infinity"), None);
        assert_eq!(parse_measurement_text("abc"), None);
        assert_eq!(parse_measurement_text(""), None);
    }
}
