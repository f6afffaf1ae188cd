//! tracing 订阅器初始化

use tracing_subscriber::EnvFilter;

/// 初始化日志（`RUST_LOG` 优先，默认 info）
pub fn init() {
    init_with(false);
}

/// 初始化日志；`verbose` 时默认级别为 debug
///
/// 重复调用无副作用，测试中可以放心调用。
pub fn init_with(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quiz_client={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
