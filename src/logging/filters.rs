use tracing_subscriber::EnvFilter;

use crate::logging::config::LoggingConfig;

/// `RUST_LOG` when set, otherwise the directive built from the config.
pub fn build_filter_from_config(config: &LoggingConfig) -> EnvFilter {
    let directive = config.build_filter_directive();

    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => match EnvFilter::try_new(&directive) {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!("Invalid log filter directive '{directive}': {e}; falling back to 'info'");
                EnvFilter::new("info")
            }
        },
    }
}
