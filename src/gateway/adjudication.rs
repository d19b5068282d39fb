// ==========================================
// 尺寸检验系统 - 外部裁决边界
// ==========================================
// 职责: 裁决请求负载构造 + 裁决响应的严格结构校验
// 响应格式: {points: [{id, status}], overall: "APPROVED"|"REJECTED", analysis}
// 红线: 校验不通过一律返回 GatewayError,由引擎降级为本地判定
// ==========================================

use crate::domain::measurement::MeasurementPoint;
use crate::domain::types::InspectionStatus;
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::extraction::strip_code_fence;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ==========================================
// 请求
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjudicationRequestPoint {
    pub id: String,
    pub label: String,
    pub nominal: f64,
    pub plus: f64,
    pub minus: f64,
    pub measured: Option<f64>,
}

/// 裁决请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjudicationRequest {
    pub model: Option<String>,
    pub points: Vec<AdjudicationRequestPoint>,
}

impl AdjudicationRequest {
    pub fn from_points(model: Option<&str>, points: &[MeasurementPoint]) -> Self {
        Self {
            model: model.map(|m| m.to_string()),
            points: points
                .iter()
                .map(|p| AdjudicationRequestPoint {
                    id: p.id.clone(),
                    label: p.label.clone(),
                    nominal: p.nominal,
                    plus: p.tolerance_plus,
                    minus: p.tolerance_minus,
                    measured: p.measured,
                })
                .collect(),
        }
    }

    pub fn point_ids(&self) -> Vec<String> {
        self.points.iter().map(|p| p.id.clone()).collect()
    }

    /// 测量数据 JSON (供裁决服务嵌入提示词)
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.points)
    }
}

// ==========================================
// 响应
// ==========================================

#[derive(Debug, Deserialize)]
struct AdjudicatedPointDto {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct AdjudicationResponseDto {
    points: Vec<AdjudicatedPointDto>,
    overall: String,
    analysis: String,
}

/// 校验通过的裁决结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjudicationVerdict {
    /// 逐点状态 (按请求顺序)
    pub statuses: Vec<(String, InspectionStatus)>,
    /// 裁决方报告的总判定
    pub overall: InspectionStatus,
    /// 裁决说明 (不透明文本)
    pub analysis: String,
}

impl AdjudicationVerdict {
    pub fn status_of(&self, point_id: &str) -> Option<InspectionStatus> {
        self.statuses
            .iter()
            .find(|(id, _)| id == point_id)
            .map(|(_, s)| *s)
    }
}

/// 解析并校验裁决响应
///
/// # 参数
/// - raw: 裁决服务原始响应文本
/// - expected_ids: 会话内全部测量点ID (决定输出顺序)
///
/// # 校验
/// - 必须为合法 JSON 且字段齐全
/// - overall 只能是 APPROVED / REJECTED
/// - 每个点状态只能是 APPROVED / REJECTED
/// - 不允许未知点、重复点、缺失点
/// - analysis 不能为空
pub fn parse_adjudication_response(
    raw: &str,
    expected_ids: &[String],
) -> GatewayResult<AdjudicationVerdict> {
    let dto: AdjudicationResponseDto = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| GatewayError::Malformed(e.to_string()))?;

    let overall = match InspectionStatus::parse(&dto.overall) {
        Some(s) if s.is_decided() => s,
        _ => return Err(GatewayError::InvalidOverall(dto.overall)),
    };

    let expected: HashSet<&str> = expected_ids.iter().map(|s| s.as_str()).collect();
    let mut by_id: HashMap<String, InspectionStatus> = HashMap::new();

    for point in dto.points {
        let id = point.id.trim().to_string();
        if !expected.contains(id.as_str()) {
            return Err(GatewayError::UnknownPoint(id));
        }
        let status = match InspectionStatus::parse(&point.status) {
            Some(s) if s.is_decided() => s,
            _ => return Err(GatewayError::UndecidedPoint(id)),
        };
        if by_id.insert(id.clone(), status).is_some() {
            return Err(GatewayError::DuplicatePoint(id));
        }
    }

    let missing: Vec<String> = expected_ids
        .iter()
        .filter(|id| !by_id.contains_key(id.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(GatewayError::MissingPoints(missing));
    }

    let analysis = dto.analysis.trim().to_string();
    if analysis.is_empty() {
        return Err(GatewayError::EmptyAnalysis);
    }

    let statuses = expected_ids
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).map(|s| (id.clone(), *s)))
        .collect();

    Ok(AdjudicationVerdict {
        statuses,
        overall,
        analysis,
    })
}
