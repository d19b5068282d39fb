// ==========================================
// 尺寸检验系统 - 测量计划数据仓储
// ==========================================
// 对齐: measurement_plan / measurement_plan_point / measurement_plan_step 表
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::measurement::PointSkeleton;
use crate::domain::plan::{builtin_plans, MeasurementPlan, WorkStep};
use crate::engine::collaborators::MeasurementPlanSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// MeasurementPlanRepository - 测量计划仓储
// ==========================================
pub struct MeasurementPlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MeasurementPlanRepository {
    /// 创建新的 MeasurementPlanRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入/覆盖型号计划 (点与步骤整体替换,同一事务)
    pub fn upsert_plan(&self, plan: &MeasurementPlan) -> RepositoryResult<()> {
        let model = plan.model.trim();
        if model.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "model".to_string(),
                message: "型号不能为空".to_string(),
            });
        }
        for point in &plan.points {
            point.band().map_err(|e| RepositoryError::FieldValueError {
                field: format!("points.{}", point.id),
                message: e.to_string(),
            })?;
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO measurement_plan (model, updated_at) VALUES (?1, datetime('now'))
               ON CONFLICT(model) DO UPDATE SET updated_at = datetime('now')"#,
            params![model],
        )?;
        tx.execute("DELETE FROM measurement_plan_point WHERE model = ?1", params![model])?;
        tx.execute("DELETE FROM measurement_plan_step WHERE model = ?1", params![model])?;

        for (seq_no, point) in plan.points.iter().enumerate() {
            tx.execute(
                r#"INSERT INTO measurement_plan_point (
                    model, point_id, seq_no, label, nominal,
                    tolerance_plus, tolerance_minus, image_url, instruction
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    model,
                    point.id,
                    seq_no as i64,
                    point.label,
                    point.nominal,
                    point.tolerance_plus,
                    point.tolerance_minus,
                    point.image_url,
                    point.instruction,
                ],
            )?;
        }

        for step in &plan.steps {
            tx.execute(
                r#"INSERT INTO measurement_plan_step (
                    model, step_id, step_no, description, image_url, critical, point_ids_json
                ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    model,
                    step.id,
                    step.step,
                    step.description,
                    step.image_url,
                    step.critical,
                    serde_json::to_string(&step.point_ids)?,
                ],
            )?;
        }

        tx.commit()?;
        tracing::debug!(
            "测量计划已写入: model={}, points={}, steps={}",
            model,
            plan.points.len(),
            plan.steps.len()
        );
        Ok(())
    }

    /// 按型号查询计划
    pub fn find_by_model(&self, model: &str) -> RepositoryResult<Option<MeasurementPlan>> {
        let conn = self.get_conn()?;

        let exists = conn
            .query_row(
                "SELECT model FROM measurement_plan WHERE model = ?1",
                params![model],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        let model = match exists {
            Some(m) => m,
            None => return Ok(None),
        };

        let mut stmt = conn.prepare(
            r#"SELECT point_id, label, nominal, tolerance_plus, tolerance_minus, image_url, instruction
               FROM measurement_plan_point WHERE model = ?1 ORDER BY seq_no"#,
        )?;
        let points = stmt
            .query_map(params![model], |row| {
                Ok(PointSkeleton {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    nominal: row.get(2)?,
                    tolerance_plus: row.get(3)?,
                    tolerance_minus: row.get(4)?,
                    image_url: row.get(5)?,
                    instruction: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            r#"SELECT step_id, step_no, description, image_url, critical, point_ids_json
               FROM measurement_plan_step WHERE model = ?1 ORDER BY step_no"#,
        )?;
        let rows = stmt
            .query_map(params![model], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut steps = Vec::with_capacity(rows.len());
        for (id, step, description, image_url, critical, point_ids_json) in rows {
            steps.push(WorkStep {
                id,
                step,
                description,
                image_url,
                critical,
                point_ids: serde_json::from_str(&point_ids_json)?,
            });
        }

        Ok(Some(MeasurementPlan::new(&model, points).with_steps(steps)))
    }

    /// 已登记的型号列表
    pub fn list_models(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT model FROM measurement_plan ORDER BY model")?;
        let models = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(models)
    }

    /// 写入内置计划 (已存在的型号不覆盖)
    ///
    /// # 返回
    /// - 新写入的型号数
    pub fn seed_builtin_plans(&self) -> RepositoryResult<usize> {
        let mut seeded = 0;
        for plan in builtin_plans() {
            if self.find_by_model(&plan.model)?.is_none() {
                self.upsert_plan(&plan)?;
                seeded += 1;
            }
        }
        if seeded > 0 {
            tracing::info!("内置测量计划已写入: count={}", seeded);
        }
        Ok(seeded)
    }
}

impl MeasurementPlanSource for MeasurementPlanRepository {
    fn find_plan(&self, model: &str) -> anyhow::Result<Option<MeasurementPlan>> {
        Ok(self.find_by_model(model)?)
    }
}
