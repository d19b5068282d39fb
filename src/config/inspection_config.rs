// ==========================================
// 尺寸检验系统 - 检验流程配置读取 Trait
// ==========================================
// 职责: 定义检验流程所需的配置读取接口 + 配置快照结构
// 实现者: ConfigManager（从 config_kv 表读取）
// 红线: 配置值无法解析时回退默认值并告警,不中断流程
// ==========================================

use crate::domain::types::AdjudicationPolicy;
use async_trait::async_trait;
use std::error::Error;
use std::time::Duration;

/// 外部裁决超时默认值（毫秒）
pub const DEFAULT_ADJUDICATION_TIMEOUT_MS: u64 = 30_000;

/// 文档提取超时默认值（毫秒）
pub const DEFAULT_EXTRACTION_TIMEOUT_MS: u64 = 60_000;

/// 检验流程配置
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionConfig {
    pub adjudication_timeout: Duration,
    pub extraction_timeout: Duration,
    pub adjudication_policy: AdjudicationPolicy,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            adjudication_timeout: Duration::from_millis(DEFAULT_ADJUDICATION_TIMEOUT_MS),
            extraction_timeout: Duration::from_millis(DEFAULT_EXTRACTION_TIMEOUT_MS),
            adjudication_policy: AdjudicationPolicy::default(),
        }
    }
}

// ==========================================
// InspectionConfigReader Trait
// ==========================================
#[async_trait]
pub trait InspectionConfigReader: Send + Sync {
    /// 外部裁决超时
    ///
    /// # 默认值
    /// - 30000 ms
    async fn get_adjudication_timeout_ms(&self) -> Result<u64, Box<dyn Error>>;

    /// 文档提取超时
    ///
    /// # 默认值
    /// - 60000 ms
    async fn get_extraction_timeout_ms(&self) -> Result<u64, Box<dyn Error>>;

    /// 裁决策略
    ///
    /// # 返回
    /// - Override: 外部裁决覆盖本地判定
    /// - Advisory: 本地判定为准,外部裁决只做审计
    ///
    /// # 默认值
    /// - OVERRIDE
    async fn get_adjudication_policy(&self) -> Result<AdjudicationPolicy, Box<dyn Error>>;

    /// 一次性读取完整配置
    async fn load_inspection_config(&self) -> Result<InspectionConfig, Box<dyn Error>> {
        let adjudication_timeout_ms = self.get_adjudication_timeout_ms().await?;
        let extraction_timeout_ms = self.get_extraction_timeout_ms().await?;
        let adjudication_policy = self.get_adjudication_policy().await?;

        Ok(InspectionConfig {
            adjudication_timeout: Duration::from_millis(adjudication_timeout_ms),
            extraction_timeout: Duration::from_millis(extraction_timeout_ms),
            adjudication_policy,
        })
    }
}
