// ==========================================
// 尺寸检验系统 - 引擎层外部协作方接口
// ==========================================
// 职责: 定义测量计划来源/文档提取/外部裁决/归档 trait,实现依赖倒置
// 说明: Engine 层定义 trait,Repository 层与外部服务适配器实现
// 红线: 协作方返回原始文本,结构校验统一在 gateway 完成
// ==========================================

use crate::domain::plan::{builtin_plans, MeasurementPlan};
use crate::domain::record::InspectionRecord;
use crate::gateway::{AdjudicationRequest, SourceDocument};
use async_trait::async_trait;
use std::collections::HashMap;

// ==========================================
// 测量计划来源
// ==========================================

/// 按型号查找静态测量计划
pub trait MeasurementPlanSource: Send + Sync {
    /// # 返回
    /// - `Ok(Some(plan))`: 找到计划
    /// - `Ok(None)`: 型号未登记
    /// - `Err`: 来源不可用
    fn find_plan(&self, model: &str) -> anyhow::Result<Option<MeasurementPlan>>;
}

/// 内存计划来源 (内置目录,用于单元测试与无数据库场景)
#[derive(Debug, Clone, Default)]
pub struct StaticPlanSource {
    plans: HashMap<String, MeasurementPlan>,
}

impl StaticPlanSource {
    pub fn new(plans: Vec<MeasurementPlan>) -> Self {
        Self {
            plans: plans.into_iter().map(|p| (p.model.clone(), p)).collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_plans())
    }
}

impl MeasurementPlanSource for StaticPlanSource {
    fn find_plan(&self, model: &str) -> anyhow::Result<Option<MeasurementPlan>> {
        Ok(self.plans.get(model).cloned())
    }
}

// ==========================================
// 文档提取
// ==========================================

/// 从控制图文档中提取测量点 (返回原始 JSON 文本)
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, document: &SourceDocument) -> anyhow::Result<String>;
}

// ==========================================
// 外部裁决
// ==========================================

/// 对一批实测值给出逐点判定与说明 (返回原始 JSON 文本)
///
/// 可能失败、超时或返回畸形响应,调用方必须准备本地降级
#[async_trait]
pub trait Adjudicator: Send + Sync {
    async fn adjudicate(&self, request: &AdjudicationRequest) -> anyhow::Result<String>;
}

// ==========================================
// 归档
// ==========================================

/// 持久化已完成的检验记录
pub trait ArchivalSink: Send + Sync {
    fn archive(&self, record: &InspectionRecord) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_plan_source_builtin() {
        let source = StaticPlanSource::builtin();
        let plan = source.find_plan("W640").unwrap().unwrap();
        assert_eq!(plan.points[0].id, "P1");
        assert!(source.find_plan("UNKNOWN").unwrap().is_none());
    }
}
