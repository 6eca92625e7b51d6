mod settings;

pub use settings::Settings;

/// Prefix of the environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "REPODUMP";

/// Environment variable naming a config file.
pub const CONFIG_PATH_ENV: &str = "REPODUMP_CONFIG";
