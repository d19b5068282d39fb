// ==========================================
// 尺寸检验系统 - 检验记录数据仓储
// ==========================================
// 对齐: inspection_record / inspection_record_point 表
// 红线: 记录与测量点在同一事务写入,只写不改
// ==========================================

use crate::domain::measurement::MeasurementPoint;
use crate::domain::record::{InspectionRecord, InspectionRecordSummary};
use crate::domain::types::{InspectionStatus, VerdictSource};
use crate::engine::collaborators::ArchivalSink;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_ts, TS_FORMAT};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

fn parse_status(col: usize, raw: &str) -> rusqlite::Result<InspectionStatus> {
    InspectionStatus::parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            col,
            rusqlite::types::Type::Text,
            format!("未知判定状态: {}", raw).into(),
        )
    })
}

fn parse_source(col: usize, raw: &str) -> rusqlite::Result<VerdictSource> {
    VerdictSource::parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            col,
            rusqlite::types::Type::Text,
            format!("未知判定来源: {}", raw).into(),
        )
    })
}

// ==========================================
// InspectionRecordRepository - 检验记录仓储
// ==========================================
pub struct InspectionRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InspectionRecordRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入检验记录
    ///
    /// # 返回
    /// - `Ok(record_id)`
    /// - `Err(UniqueConstraintViolation)`: 同一会话重复归档
    pub fn insert(&self, record: &InspectionRecord) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO inspection_record (
                record_id, session_id, model, overall_verdict, analysis_note,
                verdict_source, completed_at, archived_at, archived_by
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                record.record_id,
                record.session_id,
                record.model,
                record.overall_verdict.to_string(),
                record.analysis_note,
                record.verdict_source.to_string(),
                record.completed_at.format(TS_FORMAT).to_string(),
                record.archived_at.format(TS_FORMAT).to_string(),
                record.archived_by,
            ],
        )?;

        for (seq_no, point) in record.points.iter().enumerate() {
            tx.execute(
                r#"INSERT INTO inspection_record_point (
                    record_id, point_id, seq_no, label, nominal, tolerance_plus,
                    tolerance_minus, measured, status, image_url, instruction
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    record.record_id,
                    point.id,
                    seq_no as i64,
                    point.label,
                    point.nominal,
                    point.tolerance_plus,
                    point.tolerance_minus,
                    point.measured,
                    point.status().to_string(),
                    point.image_url,
                    point.instruction,
                ],
            )?;
        }

        tx.commit()?;
        Ok(record.record_id.clone())
    }

    /// 按记录ID查询 (含测量点明细)
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<InspectionRecord>> {
        let conn = self.get_conn()?;

        let header = conn
            .query_row(
                r#"SELECT record_id, session_id, model, overall_verdict, analysis_note,
                          verdict_source, completed_at, archived_at, archived_by
                   FROM inspection_record WHERE record_id = ?1"#,
                params![record_id],
                |row| {
                    let overall: String = row.get(3)?;
                    let source: String = row.get(5)?;
                    let completed_at: String = row.get(6)?;
                    let archived_at: String = row.get(7)?;
                    Ok(InspectionRecord {
                        record_id: row.get(0)?,
                        session_id: row.get(1)?,
                        model: row.get(2)?,
                        points: Vec::new(),
                        overall_verdict: parse_status(3, &overall)?,
                        analysis_note: row.get(4)?,
                        verdict_source: parse_source(5, &source)?,
                        completed_at: parse_ts(6, &completed_at)?,
                        archived_at: parse_ts(7, &archived_at)?,
                        archived_by: row.get(8)?,
                    })
                },
            )
            .optional()?;

        let mut record = match header {
            Some(r) => r,
            None => return Ok(None),
        };

        let mut stmt = conn.prepare(
            r#"SELECT point_id, label, nominal, tolerance_plus, tolerance_minus,
                      measured, status, image_url, instruction
               FROM inspection_record_point WHERE record_id = ?1 ORDER BY seq_no"#,
        )?;
        record.points = stmt
            .query_map(params![record_id], |row| {
                let status: String = row.get(6)?;
                Ok(MeasurementPoint {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    nominal: row.get(2)?,
                    tolerance_plus: row.get(3)?,
                    tolerance_minus: row.get(4)?,
                    measured: row.get(5)?,
                    status: parse_status(6, &status)?,
                    image_url: row.get(7)?,
                    instruction: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(record))
    }

    /// 按会话ID查询记录ID
    pub fn find_id_by_session(&self, session_id: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT record_id FROM inspection_record WHERE session_id = ?1",
                params![session_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 记录摘要列表 (按归档时间倒序)
    ///
    /// # 参数
    /// - model: None 表示全部型号
    pub fn list_summaries(
        &self,
        model: Option<&str>,
        limit: i32,
    ) -> RepositoryResult<Vec<InspectionRecordSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT r.record_id, r.model, r.overall_verdict, r.verdict_source, r.archived_at,
                      COUNT(p.point_id),
                      COALESCE(SUM(CASE WHEN p.status = 'REJECTED' THEN 1 ELSE 0 END), 0)
               FROM inspection_record r
               LEFT JOIN inspection_record_point p ON p.record_id = r.record_id
               WHERE (?1 IS NULL OR r.model = ?1)
               GROUP BY r.record_id
               ORDER BY r.archived_at DESC
               LIMIT ?2"#,
        )?;

        let summaries = stmt
            .query_map(params![model, limit], |row| {
                let overall: String = row.get(2)?;
                let source: String = row.get(3)?;
                let archived_at: String = row.get(4)?;
                Ok(InspectionRecordSummary {
                    record_id: row.get(0)?,
                    model: row.get(1)?,
                    overall_verdict: parse_status(2, &overall)?,
                    verdict_source: parse_source(3, &source)?,
                    archived_at: parse_ts(4, &archived_at)?,
                    point_count: row.get(5)?,
                    rejected_count: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(summaries)
    }
}

impl ArchivalSink for InspectionRecordRepository {
    fn archive(&self, record: &InspectionRecord) -> anyhow::Result<()> {
        self.insert(record)?;
        Ok(())
    }
}
