// ==========================================
// 尺寸检验系统 - 检验流程编排
// ==========================================
// 职责: 串联测量计划来源/文档提取/外部裁决与会话状态机
// 流程: 获取测量点 → 录入 → 本地判定 → (可选) 外部裁决 → 对账 → 完成
// 红线:
// - 外部裁决失败/超时/畸形一律降级为本地判定,会话不会卡在 VALIDATING
// - 协作方调用统一加 tokio 超时
// ==========================================

use crate::config::InspectionConfig;
use crate::domain::measurement::{MeasurementPoint, PointSkeleton};
use crate::domain::session::{ApplyOutcome, InspectionSession};
use crate::domain::types::SessionSource;
use crate::engine::collaborators::{Adjudicator, DocumentExtractor, MeasurementPlanSource};
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::engine::reconcile::{Reconciler, ValidationReport};
use crate::engine::verdict::BatchVerdict;
use crate::gateway::{
    parse_adjudication_response, parse_extraction_response, AdjudicationRequest, SourceDocument,
};
use std::sync::Arc;
use tokio::time::timeout;

// ==========================================
// InspectionWorkflow - 检验流程编排器
// ==========================================
pub struct InspectionWorkflow {
    plan_source: Arc<dyn MeasurementPlanSource>,
    extractor: Option<Arc<dyn DocumentExtractor>>,
    adjudicator: Option<Arc<dyn Adjudicator>>,
    config: InspectionConfig,
}

impl InspectionWorkflow {
    /// 创建编排器 (仅静态计划来源,本地判定)
    pub fn new(plan_source: Arc<dyn MeasurementPlanSource>, config: InspectionConfig) -> Self {
        Self {
            plan_source,
            extractor: None,
            adjudicator: None,
            config,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_adjudicator(mut self, adjudicator: Arc<dyn Adjudicator>) -> Self {
        self.adjudicator = Some(adjudicator);
        self
    }

    pub fn config(&self) -> &InspectionConfig {
        &self.config
    }

    pub fn has_adjudicator(&self) -> bool {
        self.adjudicator.is_some()
    }

    // ==========================================
    // 获取测量点
    // ==========================================

    /// 选择型号,按静态计划填充测量点
    ///
    /// # 返回
    /// - Ok(Applied): 会话进入 AWAITING_INPUT
    /// - Err(UnknownModel): 型号未登记,会话回到 IDLE
    /// - Err(ExtractionFailure): 计划来源不可用,会话停留在 ACQUIRING
    pub fn select_model(
        &self,
        session: &mut InspectionSession,
        model: &str,
    ) -> WorkflowResult<ApplyOutcome> {
        let ticket = session.begin_acquisition(model, SessionSource::ModelPlan)?;

        let plan = self.plan_source.find_plan(model.trim()).map_err(|e| {
            tracing::warn!("测量计划来源不可用: model={}, error={:#}", model, e);
            WorkflowError::ExtractionFailure(e.to_string())
        })?;

        match plan {
            Some(plan) => session.complete_acquisition(&ticket, plan.points, plan.steps),
            None => {
                session.abandon_acquisition(&ticket);
                Err(WorkflowError::UnknownModel(model.trim().to_string()))
            }
        }
    }

    /// 从控制图文档提取测量点 (不触碰会话,供调用方自行凭票据回写)
    pub async fn extract_points(
        &self,
        document: &SourceDocument,
    ) -> WorkflowResult<Vec<PointSkeleton>> {
        let extractor = self.extractor.as_ref().ok_or_else(|| {
            WorkflowError::ExtractionFailure("未配置文档提取服务".to_string())
        })?;
        if document.is_empty() {
            return Err(WorkflowError::ExtractionFailure("文档内容为空".to_string()));
        }

        let raw = match timeout(self.config.extraction_timeout, extractor.extract(document)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::warn!("文档提取失败: file={}, error={:#}", document.file_name, e);
                return Err(WorkflowError::ExtractionFailure(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    "文档提取超时: file={}, timeout_ms={}",
                    document.file_name,
                    self.config.extraction_timeout.as_millis()
                );
                return Err(WorkflowError::ExtractionFailure(format!(
                    "提取超时 ({} ms)",
                    self.config.extraction_timeout.as_millis()
                )));
            }
        };

        let points = parse_extraction_response(&raw);
        if points.is_empty() {
            return Err(WorkflowError::ExtractionFailure(
                "文档中未识别到有效测量点".to_string(),
            ));
        }
        tracing::info!(
            "文档提取完成: file={}, points={}",
            document.file_name,
            points.len()
        );
        Ok(points)
    }

    /// 提交文档并等待提取 (单写者便捷入口)
    ///
    /// 提取失败时会话停留在 ACQUIRING,可重新提交
    pub async fn submit_document(
        &self,
        session: &mut InspectionSession,
        model: &str,
        document: &SourceDocument,
    ) -> WorkflowResult<ApplyOutcome> {
        let ticket = session.begin_acquisition(model, SessionSource::Document)?;
        let points = self.extract_points(document).await?;
        session.complete_acquisition(&ticket, points, Vec::new())
    }

    // ==========================================
    // 判定
    // ==========================================

    /// 对一批已录入的测量点出具判定报告 (不触碰会话)
    ///
    /// 本地判定始终先行;外部裁决可用时再对账
    pub async fn adjudicate_points(
        &self,
        model: Option<&str>,
        points: &[MeasurementPoint],
    ) -> WorkflowResult<ValidationReport> {
        let local = BatchVerdict::deterministic(points)?;
        let policy = self.config.adjudication_policy;

        let adjudicator = match &self.adjudicator {
            Some(a) => a,
            None => return Ok(ValidationReport::fallback(local, policy, None)),
        };

        let request = AdjudicationRequest::from_points(model, points);
        let failure = match timeout(
            self.config.adjudication_timeout,
            adjudicator.adjudicate(&request),
        )
        .await
        {
            Ok(Ok(raw)) => match parse_adjudication_response(&raw, &request.point_ids()) {
                Ok(verdict) => return Reconciler::reconcile(local, verdict, policy),
                Err(e) => WorkflowError::AdjudicationFailure(format!("裁决响应无效: {}", e)),
            },
            Ok(Err(e)) => WorkflowError::AdjudicationFailure(format!("裁决服务调用失败: {:#}", e)),
            Err(_) => WorkflowError::AdjudicationFailure(format!(
                "裁决服务超时 ({} ms)",
                self.config.adjudication_timeout.as_millis()
            )),
        };

        tracing::warn!("采用本地判定: {}", failure);
        Ok(ValidationReport::fallback(local, policy, Some(failure.to_string())))
    }

    /// 判定会话 (AWAITING_INPUT → VALIDATING → COMPLETED,单写者便捷入口)
    ///
    /// # 返回
    /// - Err(IncompleteInput): 有点未录入,会话不变
    /// - Ok(report): 会话已完成
    pub async fn validate(&self, session: &mut InspectionSession) -> WorkflowResult<ValidationReport> {
        let ticket = session.begin_validation()?;

        let report = match self.adjudicate_points(session.model(), session.points()).await {
            Ok(report) => report,
            Err(e) => {
                session.abort_validation(&ticket)?;
                return Err(e);
            }
        };

        session.complete_validation(&ticket, &report.outcome)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::measurement::PointSkeleton;
    use crate::engine::collaborators::StaticPlanSource;
    use crate::engine::verdict::NON_CONFORMANT_NOTE;
    use crate::gateway::AdjudicationRequest;
    use async_trait::async_trait;

    struct FixedAdjudicator(&'static str);

    #[async_trait]
    impl Adjudicator for FixedAdjudicator {
        async fn adjudicate(&self, _request: &AdjudicationRequest) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenAdjudicator;

    #[async_trait]
    impl Adjudicator for BrokenAdjudicator {
        async fn adjudicate(&self, _request: &AdjudicationRequest) -> anyhow::Result<String> {
            anyhow::bail!("connection reset")
        }
    }

    fn rejected_points() -> Vec<MeasurementPoint> {
        let mut p = MeasurementPoint::from_skeleton(PointSkeleton::new("P1", 450.5, 0.5, 0.5));
        p.measured = Some(451.6);
        vec![p]
    }

    fn workflow(adjudicator: Arc<dyn Adjudicator>) -> InspectionWorkflow {
        InspectionWorkflow::new(Arc::new(StaticPlanSource::builtin()), InspectionConfig::default())
            .with_adjudicator(adjudicator)
    }

    #[tokio::test]
    async fn test_invalid_response_reason_is_adjudication_failure() {
        let report = workflow(Arc::new(FixedAdjudicator("not json")))
            .adjudicate_points(Some("W640"), &rejected_points())
            .await
            .unwrap();

        let reason = report.fallback_reason.unwrap();
        assert!(reason.starts_with("外部裁决失败: 裁决响应无效"), "{}", reason);
        assert_eq!(report.outcome.analysis_note, NON_CONFORMANT_NOTE);
    }

    #[tokio::test]
    async fn test_service_error_reason_is_adjudication_failure() {
        let report = workflow(Arc::new(BrokenAdjudicator))
            .adjudicate_points(Some("W640"), &rejected_points())
            .await
            .unwrap();

        let expected = WorkflowError::AdjudicationFailure(
            "裁决服务调用失败: connection reset".to_string(),
        )
        .to_string();
        assert_eq!(report.fallback_reason.as_deref(), Some(expected.as_str()));
    }
}
