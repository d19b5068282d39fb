// ==========================================
// 尺寸检验系统 - 测量点提取边界
// ==========================================
// 职责: 控制图文档提取请求 + 提取响应的结构校验
// 响应格式: [{id, label?, nominal, tolerancePlus, toleranceMinus}]
// 红线: 响应畸形时降级为空列表,不抛出
// ==========================================

use crate::domain::measurement::PointSkeleton;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 待提取的源文档 (扫描件/图片,对本系统不透明)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub file_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl SourceDocument {
    pub fn new(file_name: &str, mime_type: &str, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 提取响应条目
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractedPointDto {
    id: String,
    #[serde(default)]
    label: Option<String>,
    nominal: f64,
    tolerance_plus: f64,
    tolerance_minus: f64,
}

/// 去除 ```json ... ``` 代码围栏
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let body = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return trimmed,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// 解析提取响应
///
/// # 规则
/// - 整体不是 JSON 数组 → 空列表
/// - 单条缺字段/名义值或公差无效/ID 为空 → 丢弃该条
/// - ID 重复 → 保留首条
pub fn parse_extraction_response(raw: &str) -> Vec<PointSkeleton> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(strip_code_fence(raw)) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("提取响应无法解析, 按空列表处理: {}", e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut skeletons = Vec::with_capacity(entries.len());

    for (idx, entry) in entries.into_iter().enumerate() {
        let dto: ExtractedPointDto = match serde_json::from_value(entry) {
            Ok(dto) => dto,
            Err(e) => {
                tracing::warn!("提取响应第{}条结构无效, 已丢弃: {}", idx, e);
                continue;
            }
        };

        let id = dto.id.trim().to_string();
        if id.is_empty() {
            tracing::warn!("提取响应第{}条缺少ID, 已丢弃", idx);
            continue;
        }

        let skeleton = PointSkeleton {
            id: id.clone(),
            label: dto.label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
            nominal: dto.nominal,
            tolerance_plus: dto.tolerance_plus,
            tolerance_minus: dto.tolerance_minus,
            image_url: None,
            instruction: None,
        };

        if let Err(e) = skeleton.band() {
            tracing::warn!("提取响应测量点{}公差无效, 已丢弃: {}", id, e);
            continue;
        }

        if !seen.insert(id.clone()) {
            tracing::warn!("提取响应测量点ID重复, 已丢弃: {}", id);
            continue;
        }

        skeletons.push(skeleton);
    }

    skeletons
}
