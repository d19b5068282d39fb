// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、外部服务 Mock 等功能
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use dimensional_inspection::db::{init_schema, open_sqlite_connection};
use dimensional_inspection::engine::{Adjudicator, DocumentExtractor};
use dimensional_inspection::gateway::{AdjudicationRequest, SourceDocument};
use rusqlite::Connection;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    dimensional_inspection::logging::init_test();

    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接 (统一 PRAGMA)
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

/// 打开共享连接 (供 Repository 使用)
pub fn open_shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_test_connection(db_path)?)))
}

/// 测试用控制图文档
pub fn sample_document() -> SourceDocument {
    SourceDocument::new("control_chart.pdf", "application/pdf", b"%PDF-1.4 test".to_vec())
}

// ==========================================
// Mock 裁决服务
// ==========================================

/// 固定响应的裁决服务 (记录调用次数与最近一次请求)
pub struct ScriptedAdjudicator {
    response: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<AdjudicationRequest>>,
}

impl ScriptedAdjudicator {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// 响应前等待 (用于超时场景)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<AdjudicationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Adjudicator for ScriptedAdjudicator {
    async fn adjudicate(&self, request: &AdjudicationRequest) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.response.clone())
    }
}

/// 总是失败的裁决服务
pub struct FailingAdjudicator;

#[async_trait]
impl Adjudicator for FailingAdjudicator {
    async fn adjudicate(&self, _request: &AdjudicationRequest) -> anyhow::Result<String> {
        anyhow::bail!("service unavailable (503)")
    }
}

// ==========================================
// Mock 文档提取服务
// ==========================================

/// 固定响应的文档提取服务
pub struct ScriptedExtractor {
    response: anyhow::Result<String>,
    delay: Option<Duration>,
}

impl ScriptedExtractor {
    pub fn returning(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            delay: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(anyhow::anyhow!(message.to_string())),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl DocumentExtractor for ScriptedExtractor {
    async fn extract(&self, _document: &SourceDocument) -> anyhow::Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.response {
            Ok(raw) => Ok(raw.clone()),
            Err(e) => Err(anyhow::anyhow!(e.to_string())),
        }
    }
}

/// 三点控制图的提取响应
pub const THREE_POINT_EXTRACTION: &str = r#"[
    {"id": "P1", "label": "Basket inner diameter", "nominal": 450.5, "tolerancePlus": 0.5, "toleranceMinus": 0.5},
    {"id": "P2", "label": "Flange height", "nominal": 12.0, "tolerancePlus": 0.2, "toleranceMinus": 0.1},
    {"id": "P3", "label": "Hub bore", "nominal": 30.0, "tolerancePlus": 0.05, "toleranceMinus": 0.05}
]"#;
