// ==========================================
// 尺寸检验系统 - 公差判定纯函数库
// ==========================================
// 职责: 单点实测值相对名义值/非对称公差带的合格判定
// 红线: 无状态、无副作用、无 I/O 操作
// 规则: lower = nominal - tolerance_minus, upper = nominal + tolerance_plus
//       lower <= measured <= upper → APPROVED (闭区间, 不引入 epsilon)
// ==========================================

use crate::domain::measurement::MeasurementPoint;
use crate::domain::types::InspectionStatus;
use serde::{Deserialize, Serialize};

/// 单点判定明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceOutcome {
    pub status: InspectionStatus,
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub deviation: Option<f64>, // measured - nominal
    pub reason: String,
}

// ==========================================
// ToleranceEvaluator - 纯函数工具类
// ==========================================
pub struct ToleranceEvaluator;

impl ToleranceEvaluator {
    /// 判定单点状态
    ///
    /// # 规则
    /// - measured 缺失 → PENDING
    /// - nominal - tolerance_minus <= measured <= nominal + tolerance_plus → APPROVED
    /// - 否则 → REJECTED
    ///
    /// # 示例
    /// ```
    /// use dimensional_inspection::engine::ToleranceEvaluator;
    /// use dimensional_inspection::InspectionStatus;
    ///
    /// assert_eq!(
    ///     ToleranceEvaluator::evaluate(100.0, 0.5, 0.5, Some(100.5)),
    ///     InspectionStatus::Approved
    /// );
    /// assert_eq!(
    ///     ToleranceEvaluator::evaluate(100.0, 0.5, 0.5, None),
    ///     InspectionStatus::Pending
    /// );
    /// ```
    pub fn evaluate(
        nominal: f64,
        tolerance_plus: f64,
        tolerance_minus: f64,
        measured: Option<f64>,
    ) -> InspectionStatus {
        let measured = match measured {
            Some(m) => m,
            None => return InspectionStatus::Pending,
        };

        let lower_limit = nominal - tolerance_minus;
        let upper_limit = nominal + tolerance_plus;

        if measured >= lower_limit && measured <= upper_limit {
            InspectionStatus::Approved
        } else {
            InspectionStatus::Rejected
        }
    }

    /// 判定测量点 (不修改测量点)
    pub fn evaluate_point(point: &MeasurementPoint) -> InspectionStatus {
        Self::evaluate(
            point.nominal,
            point.tolerance_plus,
            point.tolerance_minus,
            point.measured,
        )
    }

    /// 判定测量点并输出原因
    pub fn evaluate_detailed(point: &MeasurementPoint) -> ToleranceOutcome {
        let status = Self::evaluate_point(point);
        let lower_limit = point.lower_limit();
        let upper_limit = point.upper_limit();
        let deviation = point.measured.map(|m| m - point.nominal);

        let reason = match (status, point.measured) {
            (InspectionStatus::Pending, _) | (_, None) => {
                format!("PENDING: {} measured value missing", point.id)
            }
            (InspectionStatus::Approved, Some(m)) => format!(
                "APPROVED: {} measured={} within [{}, {}]",
                point.id, m, lower_limit, upper_limit
            ),
            (InspectionStatus::Rejected, Some(m)) if m > upper_limit => format!(
                "REJECTED: {} measured={} above upper limit {}",
                point.id, m, upper_limit
            ),
            (InspectionStatus::Rejected, Some(m)) => format!(
                "REJECTED: {} measured={} below lower limit {}",
                point.id, m, lower_limit
            ),
        };

        ToleranceOutcome {
            status,
            lower_limit,
            upper_limit,
            deviation,
            reason,
        }
    }
}
