// ==========================================
// 尺寸检验系统 - 日志初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber, RUST_LOG 控制过滤
// 主要日志目标:
// - dimensional_inspection::engine::session_machine  会话状态转换 (info), 过期结果丢弃 (debug)
// - dimensional_inspection::engine::workflow         裁决降级/提取失败 (warn)
// - dimensional_inspection::engine::reconcile        裁决分歧 (warn)
// - dimensional_inspection::gateway                  响应条目丢弃 (warn)
// - dimensional_inspection::api                      审计日志写入失败 (error)
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤: 本 crate info, 依赖库 warn
const DEFAULT_FILTER: &str = "warn,dimensional_inspection=info";

/// 初始化日志系统 (写 stderr,stdout 留给命令行输出的 JSON)
///
/// # 示例
/// ```no_run
/// // 只看裁决相关日志:
/// // RUST_LOG=dimensional_inspection::engine::workflow=debug,dimensional_inspection::engine::reconcile=debug
/// dimensional_inspection::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

/// 测试日志 (本 crate debug, 可重复调用)
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("warn,dimensional_inspection=debug"))
        .with_test_writer()
        .try_init();
}
