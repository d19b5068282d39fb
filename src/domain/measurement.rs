// ==========================================
// 尺寸检验系统 - 测量点领域模型
// ==========================================
// 职责: 测量点、测量点骨架、公差带值对象
// 红线: 不含判定逻辑 (判定见 engine::tolerance)
// ==========================================

use crate::domain::types::InspectionStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// ToleranceError - 公差带校验错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToleranceError {
    #[error("名义值无效: nominal={0}")]
    InvalidNominal(f64),

    #[error("上公差无效 (必须为非负有限数): tolerance_plus={0}")]
    InvalidTolerancePlus(f64),

    #[error("下公差无效 (必须为非负有限数): tolerance_minus={0}")]
    InvalidToleranceMinus(f64),
}

// ==========================================
// ToleranceBand - 公差带 (值对象)
// ==========================================
// 上限 = nominal + tolerance_plus
// 下限 = nominal - tolerance_minus
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    nominal: f64,
    tolerance_plus: f64,
    tolerance_minus: f64,
}

impl ToleranceBand {
    /// 创建公差带
    ///
    /// # 返回
    /// - Err(ToleranceError): 名义值非有限数,或任一公差为负/非有限数
    pub fn new(nominal: f64, tolerance_plus: f64, tolerance_minus: f64) -> Result<Self, ToleranceError> {
        if !nominal.is_finite() {
            return Err(ToleranceError::InvalidNominal(nominal));
        }
        if !tolerance_plus.is_finite() || tolerance_plus < 0.0 {
            return Err(ToleranceError::InvalidTolerancePlus(tolerance_plus));
        }
        if !tolerance_minus.is_finite() || tolerance_minus < 0.0 {
            return Err(ToleranceError::InvalidToleranceMinus(tolerance_minus));
        }
        Ok(Self {
            nominal,
            tolerance_plus,
            tolerance_minus,
        })
    }

    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    pub fn tolerance_plus(&self) -> f64 {
        self.tolerance_plus
    }

    pub fn tolerance_minus(&self) -> f64 {
        self.tolerance_minus
    }

    /// 上限
    pub fn upper_limit(&self) -> f64 {
        self.nominal + self.tolerance_plus
    }

    /// 下限
    pub fn lower_limit(&self) -> f64 {
        self.nominal - self.tolerance_minus
    }
}

// ==========================================
// PointSkeleton - 测量点骨架
// ==========================================
// 来源: 型号测量计划 或 控制图文档提取
// 不含实测值与状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSkeleton {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub nominal: f64,
    pub tolerance_plus: f64,
    pub tolerance_minus: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
}

impl PointSkeleton {
    /// 创建最小骨架 (无标签/图片/作业指导)
    pub fn new(id: &str, nominal: f64, tolerance_plus: f64, tolerance_minus: f64) -> Self {
        Self {
            id: id.to_string(),
            label: None,
            nominal,
            tolerance_plus,
            tolerance_minus,
            image_url: None,
            instruction: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_instruction(mut self, instruction: &str) -> Self {
        self.instruction = Some(instruction.to_string());
        self
    }

    /// 公差带 (同时完成数值校验)
    pub fn band(&self) -> Result<ToleranceBand, ToleranceError> {
        ToleranceBand::new(self.nominal, self.tolerance_plus, self.tolerance_minus)
    }
}

// ==========================================
// MeasurementPoint - 测量点
// ==========================================
// 对齐: inspection_record_point 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementPoint {
    pub id: String,                  // 会话内唯一 (如 "P1")
    pub label: String,               // 描述
    pub nominal: f64,                // 名义值
    pub tolerance_plus: f64,         // 上公差 (>= 0)
    pub tolerance_minus: f64,        // 下公差 (>= 0)
    pub measured: Option<f64>,       // 实测值 (None = 未录入)
    pub(crate) status: InspectionStatus, // 判定状态 (仅由判定写入)
    pub image_url: Option<String>,   // 证据图片
    pub instruction: Option<String>, // 作业指导
}

impl MeasurementPoint {
    /// 由骨架创建测量点 (实测值为空, 状态为 PENDING)
    pub fn from_skeleton(skeleton: PointSkeleton) -> Self {
        let label = skeleton.label.unwrap_or_else(|| skeleton.id.clone());
        Self {
            id: skeleton.id,
            label,
            nominal: skeleton.nominal,
            tolerance_plus: skeleton.tolerance_plus,
            tolerance_minus: skeleton.tolerance_minus,
            measured: None,
            status: InspectionStatus::Pending,
            image_url: skeleton.image_url,
            instruction: skeleton.instruction,
        }
    }

    /// 当前判定状态
    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn upper_limit(&self) -> f64 {
        self.nominal + self.tolerance_plus
    }

    pub fn lower_limit(&self) -> f64 {
        self.nominal - self.tolerance_minus
    }

    pub fn has_measurement(&self) -> bool {
        self.measured.is_some()
    }
}
