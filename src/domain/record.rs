// ==========================================
// 尺寸检验系统 - 检验记录 (归档快照)
// ==========================================
// 对齐: inspection_record / inspection_record_point 表
// 红线: 只在会话 COMPLETED 后生成,一次性原子写入
// ==========================================

use crate::domain::measurement::MeasurementPoint;
use crate::domain::types::{InspectionStatus, VerdictSource};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    pub record_id: String,
    pub session_id: String,
    pub model: String,
    pub points: Vec<MeasurementPoint>,
    pub overall_verdict: InspectionStatus,
    pub analysis_note: String,
    pub verdict_source: VerdictSource,
    pub completed_at: NaiveDateTime,
    pub archived_at: NaiveDateTime,
    pub archived_by: String,
}

/// 检验记录摘要 (列表用,不含测量点明细)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecordSummary {
    pub record_id: String,
    pub model: String,
    pub overall_verdict: InspectionStatus,
    pub verdict_source: VerdictSource,
    pub point_count: i64,
    pub rejected_count: i64,
    pub archived_at: NaiveDateTime,
}
