// ==========================================
// 尺寸检验系统 - 批次总判定
// ==========================================
// 职责: 由各点状态汇总批次总判定 + 说明
// 规则: 任一点 REJECTED → 批次 REJECTED; 否则 APPROVED (严格,非多数决)
// 红线: 本地降级说明只取两条固定文案,不合成逐点细节
// ==========================================

use crate::domain::measurement::MeasurementPoint;
use crate::domain::types::{InspectionStatus, VerdictSource};
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::engine::tolerance::ToleranceEvaluator;
use serde::{Deserialize, Serialize};

/// 批次合格说明
pub const CONFORMANT_NOTE: &str =
    "All critical dimensions conform to the engineering specifications.";

/// 批次不合格说明
pub const NON_CONFORMANT_NOTE: &str =
    "Non-conformities detected in critical dimensions. The batch requires 100% inspection or containment.";

/// 单点判定结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointVerdict {
    pub point_id: String,
    pub status: InspectionStatus,
}

impl PointVerdict {
    pub fn new(point_id: &str, status: InspectionStatus) -> Self {
        Self {
            point_id: point_id.to_string(),
            status,
        }
    }
}

/// 批次判定结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub point_verdicts: Vec<PointVerdict>,
    pub overall_verdict: InspectionStatus,
    pub analysis_note: String,
    pub source: VerdictSource,
}

impl BatchOutcome {
    pub fn status_of(&self, point_id: &str) -> Option<InspectionStatus> {
        self.point_verdicts
            .iter()
            .find(|v| v.point_id == point_id)
            .map(|v| v.status)
    }

    pub fn rejected_points(&self) -> Vec<&str> {
        self.point_verdicts
            .iter()
            .filter(|v| v.status == InspectionStatus::Rejected)
            .map(|v| v.point_id.as_str())
            .collect()
    }
}

// ==========================================
// BatchVerdict - 纯函数工具类
// ==========================================
pub struct BatchVerdict;

impl BatchVerdict {
    /// 汇总总判定
    ///
    /// # 前置条件
    /// - 批次非空
    /// - 所有点均已判定 (无 PENDING)
    pub fn aggregate(verdicts: &[PointVerdict]) -> WorkflowResult<InspectionStatus> {
        if verdicts.is_empty() {
            return Err(WorkflowError::EmptyBatch);
        }

        let undecided: Vec<String> = verdicts
            .iter()
            .filter(|v| !v.status.is_decided())
            .map(|v| v.point_id.clone())
            .collect();
        if !undecided.is_empty() {
            return Err(WorkflowError::UndecidedPoints(undecided));
        }

        if verdicts.iter().any(|v| v.status == InspectionStatus::Rejected) {
            Ok(InspectionStatus::Rejected)
        } else {
            Ok(InspectionStatus::Approved)
        }
    }

    /// 本地降级说明 (只由总判定决定)
    pub fn fallback_note(overall_verdict: InspectionStatus) -> &'static str {
        match overall_verdict {
            InspectionStatus::Rejected => NON_CONFORMANT_NOTE,
            _ => CONFORMANT_NOTE,
        }
    }

    /// 本地确定性判定: 逐点公差判定 + 汇总 + 固定说明
    ///
    /// 幂等: 相同输入得到相同 (总判定, 说明)
    pub fn deterministic(points: &[MeasurementPoint]) -> WorkflowResult<BatchOutcome> {
        let point_verdicts: Vec<PointVerdict> = points
            .iter()
            .map(|p| PointVerdict::new(&p.id, ToleranceEvaluator::evaluate_point(p)))
            .collect();

        let overall_verdict = Self::aggregate(&point_verdicts)?;

        Ok(BatchOutcome {
            point_verdicts,
            overall_verdict,
            analysis_note: Self::fallback_note(overall_verdict).to_string(),
            source: VerdictSource::Deterministic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::measurement::PointSkeleton;

    fn measured_point(id: &str, nominal: f64, tol: f64, measured: f64) -> MeasurementPoint {
        let mut point = MeasurementPoint::from_skeleton(PointSkeleton::new(id, nominal, tol, tol));
        point.measured = Some(measured);
        point
    }

    #[test]
    fn test_any_rejected_rejects_batch() {
        let verdicts = vec![
            PointVerdict::new("P1", InspectionStatus::Approved),
            PointVerdict::new("P2", InspectionStatus::Rejected),
            PointVerdict::new("P3", InspectionStatus::Approved),
        ];
        assert_eq!(BatchVerdict::aggregate(&verdicts).unwrap(), InspectionStatus::Rejected);
    }

    #[test]
    fn test_all_approved_approves_batch() {
        let verdicts = vec![
            PointVerdict::new("P1", InspectionStatus::Approved),
            PointVerdict::new("P2", InspectionStatus::Approved),
        ];
        assert_eq!(BatchVerdict::aggregate(&verdicts).unwrap(), InspectionStatus::Approved);
    }

    #[test]
    fn test_single_rejection_is_not_outvoted() {
        let mut verdicts: Vec<PointVerdict> = (0..99)
            .map(|i| PointVerdict::new(&format!("P{}", i), InspectionStatus::Approved))
            .collect();
        verdicts.push(PointVerdict::new("P99", InspectionStatus::Rejected));
        assert_eq!(BatchVerdict::aggregate(&verdicts).unwrap(), InspectionStatus::Rejected);
    }

    #[test]
    fn test_pending_violates_precondition() {
        let verdicts = vec![
            PointVerdict::new("P1", InspectionStatus::Approved),
            PointVerdict::new("P2", InspectionStatus::Pending),
        ];
        match BatchVerdict::aggregate(&verdicts) {
            Err(WorkflowError::UndecidedPoints(ids)) => assert_eq!(ids, vec!["P2".to_string()]),
            other => panic!("Expected UndecidedPoints, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_batch_refused() {
        assert!(matches!(BatchVerdict::aggregate(&[]), Err(WorkflowError::EmptyBatch)));
    }

    #[test]
    fn test_fallback_note_two_fixed_strings() {
        assert_eq!(BatchVerdict::fallback_note(InspectionStatus::Approved), CONFORMANT_NOTE);
        assert_eq!(BatchVerdict::fallback_note(InspectionStatus::Rejected), NON_CONFORMANT_NOTE);
        assert_ne!(CONFORMANT_NOTE, NON_CONFORMANT_NOTE);
    }

    #[test]
    fn test_deterministic_two_approved_one_rejected() {
        let points = vec![
            measured_point("P1", 450.5, 0.5, 450.8),
            measured_point("P2", 120.0, 0.2, 120.1),
            measured_point("P3", 35.0, 0.1, 35.4),
        ];

        let outcome = BatchVerdict::deterministic(&points).unwrap();
        assert_eq!(outcome.overall_verdict, InspectionStatus::Rejected);
        assert_eq!(outcome.analysis_note, NON_CONFORMANT_NOTE);
        assert_eq!(outcome.source, VerdictSource::Deterministic);
        assert_eq!(outcome.rejected_points(), vec!["P3"]);
        assert_eq!(outcome.status_of("P1"), Some(InspectionStatus::Approved));
    }

    #[test]
    fn test_deterministic_is_idempotent() {
        let points = vec![
            measured_point("P1", 10.0, 0.1, 10.05),
            measured_point("P2", 20.0, 0.1, 19.7),
        ];

        let first = BatchVerdict::deterministic(&points).unwrap();
        let second = BatchVerdict::deterministic(&points).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            (first.overall_verdict, first.analysis_note.clone()),
            (second.overall_verdict, second.analysis_note.clone())
        );
    }

    #[test]
    fn test_deterministic_requires_all_measured() {
        let mut points = vec![measured_point("P1", 10.0, 0.1, 10.0)];
        points.push(MeasurementPoint::from_skeleton(PointSkeleton::new("P2", 5.0, 0.1, 0.1)));
        assert!(matches!(
            BatchVerdict::deterministic(&points),
            Err(WorkflowError::UndecidedPoints(_))
        ));
    }
}
