// ==========================================
// 尺寸检验系统 - 命令行入口
// ==========================================
// 用法:
//   dimensional-inspection [model] [measured...]
//
// 按型号测量计划的点顺序录入实测值,本地判定后归档,
// 以 JSON 输出检验记录。数据库路径见 get_default_db_path。
// ==========================================

use dimensional_inspection::app::{get_default_db_path, AppState};
use dimensional_inspection::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", dimensional_inspection::APP_NAME, dimensional_inspection::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let model = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "W640".to_string());
    let measured = args
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .map_err(|e| anyhow::anyhow!("实测值无法解析: {} ({})", raw, e))
        })
        .collect::<anyhow::Result<Vec<f64>>>()?;

    let operator = std::env::var("DIMENSIONAL_INSPECTION_OPERATOR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "cli".to_string());

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path).await.map_err(anyhow::Error::msg)?;
    let api = state.inspection_api.clone();

    let session = api.select_model(&model)?;
    let point_ids: Vec<String> = session.points().iter().map(|p| p.id.clone()).collect();
    if measured.len() > point_ids.len() {
        anyhow::bail!(
            "实测值数量({})超过型号{}的测量点数量({})",
            measured.len(),
            model,
            point_ids.len()
        );
    }
    for (point_id, value) in point_ids.iter().zip(&measured) {
        api.enter_measurement(point_id, Some(*value))?;
    }

    let response = api.validate(&operator).await?;
    tracing::info!(
        "判定完成: overall={}, source={}",
        response.report.outcome.overall_verdict,
        response.report.outcome.source
    );

    let archived = api.archive(&operator)?;
    let record = api.get_record(archived.record_id())?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
