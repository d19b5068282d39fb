// ==========================================
// 尺寸检验系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键/busy_timeout)
// - 统一建表入口,新库与测试库使用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 旧库版本不一致时只告警,不做自动迁移
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema (幂等)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        -- 型号测量计划
        CREATE TABLE IF NOT EXISTS measurement_plan (
            model TEXT PRIMARY KEY,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS measurement_plan_point (
            model TEXT NOT NULL REFERENCES measurement_plan(model) ON DELETE CASCADE,
            point_id TEXT NOT NULL,
            seq_no INTEGER NOT NULL,
            label TEXT,
            nominal REAL NOT NULL,
            tolerance_plus REAL NOT NULL CHECK (tolerance_plus >= 0),
            tolerance_minus REAL NOT NULL CHECK (tolerance_minus >= 0),
            image_url TEXT,
            instruction TEXT,
            PRIMARY KEY (model, point_id)
        );

        -- 作业指导步骤 (point_ids 为 JSON 数组)
        CREATE TABLE IF NOT EXISTS measurement_plan_step (
            model TEXT NOT NULL REFERENCES measurement_plan(model) ON DELETE CASCADE,
            step_id TEXT NOT NULL,
            step_no INTEGER NOT NULL,
            description TEXT NOT NULL,
            image_url TEXT,
            critical INTEGER NOT NULL DEFAULT 0,
            point_ids_json TEXT NOT NULL DEFAULT '[]',
            PRIMARY KEY (model, step_id)
        );

        -- 检验记录 (归档快照,只写不改)
        CREATE TABLE IF NOT EXISTS inspection_record (
            record_id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL UNIQUE,
            model TEXT NOT NULL,
            overall_verdict TEXT NOT NULL,
            analysis_note TEXT NOT NULL,
            verdict_source TEXT NOT NULL,
            completed_at TEXT NOT NULL,
            archived_at TEXT NOT NULL,
            archived_by TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_inspection_record_model
            ON inspection_record(model, archived_at);

        CREATE TABLE IF NOT EXISTS inspection_record_point (
            record_id TEXT NOT NULL REFERENCES inspection_record(record_id) ON DELETE CASCADE,
            point_id TEXT NOT NULL,
            seq_no INTEGER NOT NULL,
            label TEXT NOT NULL,
            nominal REAL NOT NULL,
            tolerance_plus REAL NOT NULL,
            tolerance_minus REAL NOT NULL,
            measured REAL,
            status TEXT NOT NULL,
            image_url TEXT,
            instruction TEXT,
            PRIMARY KEY (record_id, point_id)
        );

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            session_id TEXT,
            record_id TEXT,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            model TEXT,
            payload_json TEXT,
            detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_action_log_session
            ON action_log(session_id, action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let global: i64 = conn
            .query_row("SELECT COUNT(*) FROM config_scope WHERE scope_id = 'global'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(global, 1);
    }
}
