use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::Layer as LayerTrait,
    registry::LookupSpan,
};

use crate::logging::config::{LogFormat, LoggingConfig};

/// Builds a fmt layer for `format` writing to `writer`.
///
/// Boxed so that json, pretty and compact layers share one type.
pub fn build_formatter_from_config<S, W>(
    config: &LoggingConfig,
    format: LogFormat,
    with_ansi: bool,
    writer: W,
) -> Box<dyn LayerTrait<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => {
            let json_fmt = fmt::format().json().with_current_span(true);
            let layer = fmt::layer()
                .event_format(json_fmt)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(config.with_target);
            Box::new(layer)
        }
        LogFormat::Pretty => {
            let pretty_fmt = fmt::format().pretty();
            let layer = fmt::layer()
                .event_format(pretty_fmt)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(writer)
                .with_ansi(with_ansi)
                .with_target(config.with_target);
            Box::new(layer)
        }
        LogFormat::Compact => {
            let compact_fmt = fmt::format().compact();
            let layer = fmt::layer()
                .event_format(compact_fmt)
                .with_writer(writer)
                .with_ansi(with_ansi)
                .with_target(config.with_target);
            Box::new(layer)
        }
    }
}
