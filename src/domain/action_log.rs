// ==========================================
// 尺寸检验系统 - 操作日志领域模型
// ==========================================
// 职责: 检验归档、裁决降级、裁决分歧的审计记录
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 红线: 归档与裁决分歧必须留痕
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,                // 日志ID
    pub session_id: Option<String>,       // 关联检验会话
    pub record_id: Option<String>,        // 关联检验记录 (归档后才有)
    pub action_type: String,              // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,         // 操作时间戳
    pub actor: String,                    // 操作人
    pub model: Option<String>,            // 产品型号
    pub payload_json: Option<JsonValue>,  // 操作负载 (JSON)
    pub detail: Option<String>,           // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    InspectionArchived,        // 检验记录归档
    ExtractionFailed,          // 测量点提取失败
    AdjudicationFallback,      // 外部裁决不可用,降级为本地判定
    AdjudicationDisagreement,  // 外部裁决与本地判定不一致
    AdjudicationAdvisory,      // ADVISORY 模式下留存的裁决说明
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::InspectionArchived => "InspectionArchived",
            ActionType::ExtractionFailed => "ExtractionFailed",
            ActionType::AdjudicationFallback => "AdjudicationFallback",
            ActionType::AdjudicationDisagreement => "AdjudicationDisagreement",
            ActionType::AdjudicationAdvisory => "AdjudicationAdvisory",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "InspectionArchived" => Some(ActionType::InspectionArchived),
            "ExtractionFailed" => Some(ActionType::ExtractionFailed),
            "AdjudicationFallback" => Some(ActionType::AdjudicationFallback),
            "AdjudicationDisagreement" => Some(ActionType::AdjudicationDisagreement),
            "AdjudicationAdvisory" => Some(ActionType::AdjudicationAdvisory),
            _ => None,
        }
    }
}

impl ActionLog {
    /// 创建新的操作日志 (action_id 使用 UUID)
    pub fn new(action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            session_id: None,
            record_id: None,
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            model: None,
            payload_json: None,
            detail: None,
        }
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn with_record(mut self, record_id: &str) -> Self {
        self.record_id = Some(record_id.to_string());
        self
    }

    pub fn with_model(mut self, model: Option<&str>) -> Self {
        self.model = model.map(|m| m.to_string());
        self
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_roundtrip() {
        for t in [
            ActionType::InspectionArchived,
            ActionType::ExtractionFailed,
            ActionType::AdjudicationFallback,
            ActionType::AdjudicationDisagreement,
            ActionType::AdjudicationAdvisory,
        ] {
            assert_eq!(ActionType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ActionType::parse("Recalc"), None);
    }

    #[test]
    fn test_builder_sets_fields() {
        let log = ActionLog::new(ActionType::InspectionArchived, "operator1")
            .with_session("S1")
            .with_record("R1")
            .with_model(Some("W640"))
            .with_payload(&serde_json::json!({"overall": "APPROVED"}))
            .with_detail("archived");

        assert_eq!(log.action_type, "InspectionArchived");
        assert_eq!(log.session_id.as_deref(), Some("S1"));
        assert_eq!(log.record_id.as_deref(), Some("R1"));
        assert_eq!(log.model.as_deref(), Some("W640"));
        assert_eq!(log.payload_json.unwrap()["overall"], "APPROVED");
    }
}
