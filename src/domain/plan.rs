// ==========================================
// 尺寸检验系统 - 测量计划领域模型
// ==========================================
// 职责: 型号测量计划 (测量点骨架 + 作业指导步骤)
// 存储: measurement_plan / measurement_plan_point / measurement_plan_step 表
// ==========================================

use crate::domain::measurement::PointSkeleton;
use serde::{Deserialize, Serialize};

// ==========================================
// WorkStep - 作业指导步骤 (FITP)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkStep {
    pub id: String,
    pub step: i32,                // 步骤序号 (从 1 开始)
    pub description: String,
    pub image_url: Option<String>,
    pub critical: bool,           // 关键工序
    pub point_ids: Vec<String>,   // 本步骤需测量的点
}

// ==========================================
// MeasurementPlan - 型号测量计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementPlan {
    pub model: String,
    pub points: Vec<PointSkeleton>,
    pub steps: Vec<WorkStep>,
}

impl MeasurementPlan {
    pub fn new(model: &str, points: Vec<PointSkeleton>) -> Self {
        Self {
            model: model.to_string(),
            points,
            steps: Vec::new(),
        }
    }

    pub fn with_steps(mut self, steps: Vec<WorkStep>) -> Self {
        self.steps = steps;
        self
    }

    /// 按步骤序号查找
    pub fn step(&self, step_no: i32) -> Option<&WorkStep> {
        self.steps.iter().find(|s| s.step == step_no)
    }

    /// 某步骤关联的测量点骨架 (保持计划内顺序)
    pub fn points_for_step(&self, step_no: i32) -> Vec<&PointSkeleton> {
        match self.step(step_no) {
            Some(step) => self
                .points
                .iter()
                .filter(|p| step.point_ids.iter().any(|id| id == &p.id))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// 内置测量计划
///
/// 新库初始化时写入 measurement_plan 表
pub fn builtin_plans() -> Vec<MeasurementPlan> {
    vec![MeasurementPlan::new(
        "W640",
        vec![PointSkeleton::new("P1", 450.5, 0.5, 0.5)
            .with_label("Basket inner diameter")
            .with_instruction("Measure with a 600mm digital caliper on the upper face of the basket.")],
    )
    .with_steps(vec![WorkStep {
        id: "F1".to_string(),
        step: 1,
        description: "Basket/tub assembly".to_string(),
        image_url: None,
        critical: true,
        point_ids: vec!["P1".to_string()],
    }])]
}
