// ==========================================
// 尺寸检验系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::InspectionApi;
use crate::config::{ConfigManager, InspectionConfigReader};
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::{Adjudicator, DocumentExtractor, InspectionWorkflow, MeasurementPlanSource};
use crate::repository::{ActionLogRepository, InspectionRecordRepository, MeasurementPlanRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 检验会话API
    pub inspection_api: Arc<InspectionApi>,

    /// 检验流程编排器
    pub workflow: Arc<InspectionWorkflow>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 测量计划仓储
    pub plan_repo: Arc<MeasurementPlanRepository>,

    /// 检验记录仓储
    pub record_repo: Arc<InspectionRecordRepository>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例 (仅本地判定,不接外部服务)
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub async fn new(db_path: String) -> Result<Self, String> {
        Self::with_collaborators(db_path, None, None).await
    }

    /// 创建AppState并接入外部提取/裁决服务
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表,写入内置测量计划
    /// 2. 从 config_kv 读取检验流程配置
    /// 3. 装配流程编排器与API实例
    pub async fn with_collaborators(
        db_path: String,
        extractor: Option<Arc<dyn DocumentExtractor>>,
        adjudicator: Option<Arc<dyn Adjudicator>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(Some(v)) if v == CURRENT_SCHEMA_VERSION => {}
            Ok(v) => tracing::warn!(
                "schema_version 与代码不一致: db={:?}, expected={}",
                v,
                CURRENT_SCHEMA_VERSION
            ),
            Err(e) => tracing::warn!("schema_version 读取失败(将继续启动): {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let plan_repo = Arc::new(MeasurementPlanRepository::new(conn.clone()));
        let record_repo = Arc::new(InspectionRecordRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        plan_repo
            .seed_builtin_plans()
            .map_err(|e| format!("内置测量计划写入失败: {}", e))?;

        // ==========================================
        // 初始化配置与引擎
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法初始化配置管理器: {}", e))?,
        );
        let config = config_manager
            .load_inspection_config()
            .await
            .map_err(|e| format!("检验配置读取失败: {}", e))?;
        tracing::info!(
            "检验配置: adjudication_timeout={:?}, extraction_timeout={:?}, policy={}",
            config.adjudication_timeout,
            config.extraction_timeout,
            config.adjudication_policy
        );

        let plan_source: Arc<dyn MeasurementPlanSource> = plan_repo.clone();
        let mut workflow = InspectionWorkflow::new(plan_source, config);
        if let Some(extractor) = extractor {
            workflow = workflow.with_extractor(extractor);
        }
        if let Some(adjudicator) = adjudicator {
            workflow = workflow.with_adjudicator(adjudicator);
        }
        let workflow = Arc::new(workflow);

        // ==========================================
        // 初始化API层
        // ==========================================
        let inspection_api = Arc::new(InspectionApi::new(
            workflow.clone(),
            plan_repo.clone(),
            record_repo.clone(),
            action_log_repo.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            inspection_api,
            workflow,
            config_manager,
            plan_repo,
            record_repo,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 DIMENSIONAL_INSPECTION_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("DIMENSIONAL_INSPECTION_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./dimensional_inspection.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("dimensional-inspection-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("dimensional-inspection");
        }

        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&path).is_err() {
            return "./dimensional_inspection.db".to_string();
        }
        path = path.join("dimensional_inspection.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }
}
