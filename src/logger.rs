//! 日志初始化

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化全局日志订阅者
///
/// 日志级别由 `RUST_LOG` 控制，默认 `info`；重复调用不会报错
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
