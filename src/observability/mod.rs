//! 可观测性：日志初始化与分层计时

use std::time::Instant;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 安装全局订阅者：默认 info，可通过 RUST_LOG 覆盖；重复调用无副作用
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// 执行一个层级动作并记录耗时与是否成功
pub fn timed<T, E, F>(layer: &str, action: &str, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    let start = Instant::now();
    let result = f();
    let elapsed_ms = (start.elapsed().as_secs_f64() * 1_000_000.0).round() / 1000.0;
    tracing::info!(
        layer,
        action,
        elapsed_ms,
        ok = result.is_ok(),
        "layer timing"
    );
    result
}
