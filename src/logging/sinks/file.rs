use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling::daily};
use tracing_subscriber::{layer::Layer as LayerTrait, registry::LookupSpan};

use crate::logging::{config::LoggingConfig, formatter};

/// Daily rolling file layer under `log_dir`, without colours.
///
/// The returned guard flushes the writer when dropped.
pub fn layer_with_config<S>(
    config: &LoggingConfig
) -> (Box<dyn LayerTrait<S> + Send + Sync>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let appender = daily(&config.log_dir, &config.file_name);
    let (writer, guard) = non_blocking(appender);
    let layer = formatter::build_formatter_from_config(config, config.format, false, writer);
    (layer, guard)
}
