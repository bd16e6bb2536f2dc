//! 日志初始化 (tracing-subscriber)
//!
//! RUST_LOG 优先;否则使用 PY_LOG_LEVEL 风格的级别名。
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// DEBUG / INFO / WARN(ING) / ERROR / CRITICAL → tracing 级别
pub fn level_directive(level: &str) -> Result<&'static str, ConfigError> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok("trace"),
        "DEBUG" => Ok("debug"),
        "INFO" => Ok("info"),
        "WARN" | "WARNING" => Ok("warn"),
        "ERROR" | "CRITICAL" => Ok("error"),
        _ => Err(ConfigError::InvalidValue {
            key: "PY_LOG_LEVEL".into(),
            value: level.to_string(),
        }),
    }
}

/// 安装全局日志;已安装时返回 false
pub fn init_logging(level: &str, dev_mode: bool) -> Result<bool, ConfigError> {
    let directive = level_directive(level)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true);
    // 开发模式输出源码位置
    let installed = if dev_mode {
        builder
            .with_file(true)
            .with_line_number(true)
            .try_init()
            .is_ok()
    } else {
        builder.with_target(false).try_init().is_ok()
    };
    Ok(installed)
}
