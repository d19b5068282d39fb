// ==========================================
// 配置层集成测试
// ==========================================
// 测试范围: ConfigManager 读写 config_kv、检验流程配置读取与回退
// ==========================================

mod test_helpers;

use dimensional_inspection::config::{config_keys, ConfigManager, InspectionConfigReader};
use dimensional_inspection::AdjudicationPolicy;
use std::time::Duration;
use test_helpers::create_test_db;

#[tokio::test]
async fn test_defaults_when_unset() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();

    let config = config_manager.load_inspection_config().await.unwrap();
    assert_eq!(config.adjudication_timeout, Duration::from_millis(30_000));
    assert_eq!(config.extraction_timeout, Duration::from_millis(60_000));
    assert_eq!(config.adjudication_policy, AdjudicationPolicy::Override);
}

#[tokio::test]
async fn test_configured_values() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();

    config_manager
        .set_value(config_keys::ADJUDICATION_TIMEOUT_MS, "2500")
        .unwrap();
    config_manager
        .set_value(config_keys::EXTRACTION_TIMEOUT_MS, "9000")
        .unwrap();
    config_manager
        .set_value(config_keys::ADJUDICATION_POLICY, "advisory")
        .unwrap();

    let config = config_manager.load_inspection_config().await.unwrap();
    assert_eq!(config.adjudication_timeout, Duration::from_millis(2500));
    assert_eq!(config.extraction_timeout, Duration::from_millis(9000));
    assert_eq!(config.adjudication_policy, AdjudicationPolicy::Advisory);
}

#[tokio::test]
async fn test_invalid_values_fall_back() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();

    config_manager
        .set_value(config_keys::ADJUDICATION_TIMEOUT_MS, "0")
        .unwrap();
    config_manager
        .set_value(config_keys::EXTRACTION_TIMEOUT_MS, "fast")
        .unwrap();
    config_manager
        .set_value(config_keys::ADJUDICATION_POLICY, "MAJORITY")
        .unwrap();

    assert_eq!(config_manager.get_adjudication_timeout_ms().await.unwrap(), 30_000);
    assert_eq!(config_manager.get_extraction_timeout_ms().await.unwrap(), 60_000);
    assert_eq!(
        config_manager.get_adjudication_policy().await.unwrap(),
        AdjudicationPolicy::Override
    );
}

#[tokio::test]
async fn test_values_persist_across_managers() {
    let (_temp_file, db_path) = create_test_db().unwrap();

    ConfigManager::new(&db_path)
        .unwrap()
        .set_value(config_keys::ADJUDICATION_TIMEOUT_MS, "750")
        .unwrap();

    let reopened = ConfigManager::new(&db_path).unwrap();
    assert_eq!(
        reopened
            .get_global_config_value(config_keys::ADJUDICATION_TIMEOUT_MS)
            .unwrap()
            .as_deref(),
        Some("750")
    );
    assert_eq!(
        reopened.get_config_snapshot().unwrap(),
        r#"{"inspection_adjudication_timeout_ms":"750"}"#
    );
}
