// ==========================================
// 尺寸检验系统 - 裁决对账
// ==========================================
// 职责: 合并本地公差判定与外部裁决结果,报告分歧
// 规则:
// - OVERRIDE: 逐点状态取外部裁决,说明取裁决文本
// - ADVISORY: 逐点状态与说明均取本地结果,裁决只用于审计
// - 总判定始终按最终逐点状态重新汇总
// ==========================================

use crate::domain::types::{AdjudicationPolicy, InspectionStatus, VerdictSource};
use crate::engine::error::WorkflowResult;
use crate::engine::verdict::{BatchOutcome, BatchVerdict, PointVerdict};
use crate::gateway::AdjudicationVerdict;
use serde::{Deserialize, Serialize};

/// 单点分歧
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disagreement {
    pub point_id: String,
    pub local: InspectionStatus,
    pub adjudicator: InspectionStatus,
}

/// 判定报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub outcome: BatchOutcome,
    pub policy: AdjudicationPolicy,
    /// 本地与外部裁决逐点不一致
    pub disagreements: Vec<Disagreement>,
    /// 裁决方自报总判定与其逐点状态不一致时,记录其自报值
    pub reported_overall_mismatch: Option<InspectionStatus>,
    /// 外部裁决不可用时的原因 (None 表示未降级)
    pub fallback_reason: Option<String>,
    /// 外部裁决说明 (ADVISORY 模式下不进入 outcome,仅供审计)
    pub adjudicator_analysis: Option<String>,
}

impl ValidationReport {
    /// 本地降级报告
    pub fn fallback(local: BatchOutcome, policy: AdjudicationPolicy, reason: Option<String>) -> Self {
        Self {
            outcome: local,
            policy,
            disagreements: Vec::new(),
            reported_overall_mismatch: None,
            fallback_reason: reason,
            adjudicator_analysis: None,
        }
    }

    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }

    pub fn has_disagreements(&self) -> bool {
        !self.disagreements.is_empty()
    }
}

pub struct Reconciler;

impl Reconciler {
    /// 对账
    ///
    /// # 参数
    /// - local: 本地确定性判定结果
    /// - adjudication: 已通过边界校验的外部裁决
    /// - policy: 裁决策略
    pub fn reconcile(
        local: BatchOutcome,
        adjudication: AdjudicationVerdict,
        policy: AdjudicationPolicy,
    ) -> WorkflowResult<ValidationReport> {
        let disagreements: Vec<Disagreement> = local
            .point_verdicts
            .iter()
            .filter_map(|v| {
                let remote = adjudication.status_of(&v.point_id)?;
                (remote != v.status).then(|| Disagreement {
                    point_id: v.point_id.clone(),
                    local: v.status,
                    adjudicator: remote,
                })
            })
            .collect();

        for d in &disagreements {
            tracing::warn!(
                "外部裁决与本地判定不一致: point={}, local={}, adjudicator={}",
                d.point_id,
                d.local,
                d.adjudicator
            );
        }

        let outcome = match policy {
            AdjudicationPolicy::Advisory => local,
            AdjudicationPolicy::Override => {
                // 外部裁决缺失某点时以本地状态兜底 (边界校验已保证覆盖)
                let point_verdicts: Vec<PointVerdict> = local
                    .point_verdicts
                    .iter()
                    .map(|v| {
                        let status = adjudication.status_of(&v.point_id).unwrap_or(v.status);
                        PointVerdict::new(&v.point_id, status)
                    })
                    .collect();
                let overall_verdict = BatchVerdict::aggregate(&point_verdicts)?;

                BatchOutcome {
                    point_verdicts,
                    overall_verdict,
                    analysis_note: adjudication.analysis.clone(),
                    source: VerdictSource::Adjudicator,
                }
            }
        };

        let recomputed = BatchVerdict::aggregate(
            &adjudication
                .statuses
                .iter()
                .map(|(id, s)| PointVerdict::new(id, *s))
                .collect::<Vec<_>>(),
        )?;
        let reported_overall_mismatch = if recomputed != adjudication.overall {
            tracing::warn!(
                "外部裁决总判定与其逐点状态不一致: reported={}, recomputed={}",
                adjudication.overall,
                recomputed
            );
            Some(adjudication.overall)
        } else {
            None
        };

        Ok(ValidationReport {
            outcome,
            policy,
            disagreements,
            reported_overall_mismatch,
            fallback_reason: None,
            adjudicator_analysis: Some(adjudication.analysis),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::verdict::{CONFORMANT_NOTE, NON_CONFORMANT_NOTE};

    fn local_outcome(statuses: &[(&str, InspectionStatus)]) -> BatchOutcome {
        let point_verdicts: Vec<PointVerdict> =
            statuses.iter().map(|(id, s)| PointVerdict::new(id, *s)).collect();
        let overall_verdict = BatchVerdict::aggregate(&point_verdicts).unwrap();
        BatchOutcome {
            point_verdicts,
            overall_verdict,
            analysis_note: BatchVerdict::fallback_note(overall_verdict).to_string(),
            source: VerdictSource::Deterministic,
        }
    }

    fn adjudication(
        statuses: &[(&str, InspectionStatus)],
        overall: InspectionStatus,
    ) -> AdjudicationVerdict {
        AdjudicationVerdict {
            statuses: statuses.iter().map(|(id, s)| (id.to_string(), *s)).collect(),
            overall,
            analysis: "Precision is adequate.".to_string(),
        }
    }

    #[test]
    fn test_override_agreeing_adjudicator() {
        use InspectionStatus::*;
        let local = local_outcome(&[("P1", Approved), ("P2", Approved)]);
        let remote = adjudication(&[("P1", Approved), ("P2", Approved)], Approved);

        let report = Reconciler::reconcile(local, remote, AdjudicationPolicy::Override).unwrap();
        assert_eq!(report.outcome.overall_verdict, Approved);
        assert_eq!(report.outcome.source, VerdictSource::Adjudicator);
        assert_eq!(report.outcome.analysis_note, "Precision is adequate.");
        assert!(!report.has_disagreements());
        assert!(!report.used_fallback());
        assert_eq!(report.reported_overall_mismatch, None);
    }

    #[test]
    fn test_override_applies_adjudicator_status_and_records_disagreement() {
        use InspectionStatus::*;
        let local = local_outcome(&[("P1", Approved), ("P2", Approved)]);
        let remote = adjudication(&[("P1", Approved), ("P2", Rejected)], Rejected);

        let report = Reconciler::reconcile(local, remote, AdjudicationPolicy::Override).unwrap();
        assert_eq!(report.outcome.overall_verdict, Rejected);
        assert_eq!(report.outcome.status_of("P2"), Some(Rejected));
        assert_eq!(
            report.disagreements,
            vec![Disagreement {
                point_id: "P2".to_string(),
                local: Approved,
                adjudicator: Rejected,
            }]
        );
    }

    #[test]
    fn test_advisory_keeps_local_result() {
        use InspectionStatus::*;
        let local = local_outcome(&[("P1", Rejected)]);
        let remote = adjudication(&[("P1", Approved)], Approved);

        let report = Reconciler::reconcile(local, remote, AdjudicationPolicy::Advisory).unwrap();
        assert_eq!(report.outcome.overall_verdict, Rejected);
        assert_eq!(report.outcome.analysis_note, NON_CONFORMANT_NOTE);
        assert_eq!(report.outcome.source, VerdictSource::Deterministic);
        assert_eq!(report.disagreements.len(), 1);
        assert_eq!(report.adjudicator_analysis.as_deref(), Some("Precision is adequate."));
    }

    #[test]
    fn test_overall_recomputed_from_point_statuses() {
        use InspectionStatus::*;
        let local = local_outcome(&[("P1", Approved), ("P2", Approved)]);
        // 裁决方逐点全部合格,却自报 REJECTED
        let remote = adjudication(&[("P1", Approved), ("P2", Approved)], Rejected);

        let report = Reconciler::reconcile(local, remote, AdjudicationPolicy::Override).unwrap();
        assert_eq!(report.outcome.overall_verdict, Approved);
        assert_eq!(report.reported_overall_mismatch, Some(Rejected));
    }

    #[test]
    fn test_fallback_report() {
        use InspectionStatus::*;
        let local = local_outcome(&[("P1", Approved)]);
        let report = ValidationReport::fallback(
            local,
            AdjudicationPolicy::Override,
            Some("timeout".to_string()),
        );
        assert!(report.used_fallback());
        assert_eq!(report.outcome.analysis_note, CONFORMANT_NOTE);
    }
}
