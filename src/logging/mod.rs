//! Logging setup on top of `tracing-subscriber`.
//!
//! Console output goes to stderr; an optional daily rolling file is written
//! through a non-blocking appender whose guard lives in [`LoggingHandle`].

pub mod config;
mod filters;
mod formatter;
pub mod handle;
pub mod sinks;

pub use config::{LogFormat, LoggingConfig};
pub use handle::LoggingHandle;
use repodump_error::{GenericError, RepodumpResult, ResultExt, StatusCode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
///
/// Fails on an invalid config or when a global subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> RepodumpResult<LoggingHandle> {
    config.validate()?;
    config.ensure_log_dir()?;

    let env_filter = filters::build_filter_from_config(&config);
    let mut layers = Vec::new();

    if config.console_enabled {
        layers.push(sinks::console::layer_with_config(&config));
    }

    let file_guard = if config.file_enabled {
        let (file_layer, guard) = sinks::file::layer_with_config(&config);
        layers.push(file_layer);
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| GenericError::new(StatusCode::Internal, e.to_string()))
        .context("Installing log subscriber")?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = %config.format,
        log_dir = %config.log_dir.display(),
        console_enabled = config.console_enabled,
        file_enabled = config.file_enabled,
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}
