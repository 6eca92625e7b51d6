use std::io::{self, Stderr};

use tracing_subscriber::{layer::Layer as LayerTrait, registry::LookupSpan};

use crate::logging::{config::LoggingConfig, formatter};

/// Console layer. Logs go to stderr so stdout stays free for the run summary.
pub fn layer_with_config<S>(config: &LoggingConfig) -> Box<dyn LayerTrait<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer: fn() -> Stderr = io::stderr;
    formatter::build_formatter_from_config(config, config.format, config.with_ansi, writer)
}
