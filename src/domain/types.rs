// ==========================================
// 尺寸检验系统 - 领域类型定义
// ==========================================
// 职责: 检验状态、会话状态、判定来源等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 检验状态 (Inspection Status)
// ==========================================
// 单点状态与批次总判定共用
// 红线: 只能由判定逻辑写入,不能由录入表单直接设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionStatus {
    #[serde(alias = "PENDENTE")]
    Pending, // 待判定
    #[serde(alias = "APROVADO")]
    Approved, // 合格
    #[serde(alias = "REPROVADO")]
    Rejected, // 不合格
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectionStatus::Pending => write!(f, "PENDING"),
            InspectionStatus::Approved => write!(f, "APPROVED"),
            InspectionStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl InspectionStatus {
    /// 从字符串解析状态
    ///
    /// 兼容上游服务的葡语取值 (APROVADO / REPROVADO / PENDENTE)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" | "PENDENTE" => Some(InspectionStatus::Pending),
            "APPROVED" | "APROVADO" => Some(InspectionStatus::Approved),
            "REJECTED" | "REPROVADO" => Some(InspectionStatus::Rejected),
            _ => None,
        }
    }

    /// 是否已完成判定
    pub fn is_decided(&self) -> bool {
        !matches!(self, InspectionStatus::Pending)
    }
}

// ==========================================
// 会话状态 (Session State)
// ==========================================
// IDLE → ACQUIRING → AWAITING_INPUT → VALIDATING → COMPLETED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Idle,          // 未选择型号
    Acquiring,     // 获取测量点中
    AwaitingInput, // 等待录入实测值
    Validating,    // 判定中
    Completed,     // 已完成
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "IDLE"),
            SessionState::Acquiring => write!(f, "ACQUIRING"),
            SessionState::AwaitingInput => write!(f, "AWAITING_INPUT"),
            SessionState::Validating => write!(f, "VALIDATING"),
            SessionState::Completed => write!(f, "COMPLETED"),
        }
    }
}

// ==========================================
// 测量点来源 (Session Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionSource {
    ModelPlan, // 型号预置测量计划
    Document,  // 控制图文档提取
}

impl fmt::Display for SessionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionSource::ModelPlan => write!(f, "MODEL_PLAN"),
            SessionSource::Document => write!(f, "DOCUMENT"),
        }
    }
}

// ==========================================
// 判定来源 (Verdict Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictSource {
    #[default]
    Deterministic, // 本地公差判定
    Adjudicator,   // 外部裁决服务
}

impl fmt::Display for VerdictSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictSource::Deterministic => write!(f, "DETERMINISTIC"),
            VerdictSource::Adjudicator => write!(f, "ADJUDICATOR"),
        }
    }
}

impl VerdictSource {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DETERMINISTIC" => Some(VerdictSource::Deterministic),
            "ADJUDICATOR" => Some(VerdictSource::Adjudicator),
            _ => None,
        }
    }
}

// ==========================================
// 裁决策略 (Adjudication Policy)
// ==========================================
// OVERRIDE: 外部裁决覆盖本地结果
// ADVISORY: 本地结果为准,外部裁决仅提供说明
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjudicationPolicy {
    #[default]
    Override,
    Advisory,
}

impl fmt::Display for AdjudicationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjudicationPolicy::Override => write!(f, "OVERRIDE"),
            AdjudicationPolicy::Advisory => write!(f, "ADVISORY"),
        }
    }
}

impl AdjudicationPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OVERRIDE" => Some(AdjudicationPolicy::Override),
            "ADVISORY" => Some(AdjudicationPolicy::Advisory),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_accepts_source_aliases() {
        assert_eq!(InspectionStatus::parse("APROVADO"), Some(InspectionStatus::Approved));
        assert_eq!(InspectionStatus::parse("reprovado"), Some(InspectionStatus::Rejected));
        assert_eq!(InspectionStatus::parse(" PENDING "), Some(InspectionStatus::Pending));
        assert_eq!(InspectionStatus::parse("OK"), None);
    }

    #[test]
    fn test_status_serde_format() {
        let json = serde_json::to_string(&InspectionStatus::Rejected).unwrap();
        assert_eq!(json, "\"REJECTED\"");

        let parsed: InspectionStatus = serde_json::from_str("\"APROVADO\"").unwrap();
        assert_eq!(parsed, InspectionStatus::Approved);
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::AwaitingInput.to_string(), "AWAITING_INPUT");
        assert_eq!(SessionState::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn test_policy_default_is_override() {
        assert_eq!(AdjudicationPolicy::default(), AdjudicationPolicy::Override);
        assert_eq!(AdjudicationPolicy::parse("advisory"), Some(AdjudicationPolicy::Advisory));
    }
}
