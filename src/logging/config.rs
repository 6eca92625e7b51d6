use std::{env, fmt, path::PathBuf, str::FromStr};

use repodump_error::{ensure, RepodumpResult, ResultExt, StatusCode};
use serde::{Deserialize, Serialize};

pub const ENV_LOG_LEVEL: &str = "REPODUMP_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "REPODUMP_LOG_FORMAT";
pub const ENV_LOG_DIR: &str = "REPODUMP_LOG_DIR";

/// Output format of log lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!(
                "unknown log format '{other}' (expected pretty, compact or json)"
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for this crate's events; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
    pub console_enabled: bool,
    pub with_ansi: bool,
    pub with_target: bool,
    /// Daily rolling file under `log_dir`.
    pub file_enabled: bool,
    pub log_dir: PathBuf,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            console_enabled: true,
            with_ansi: true,
            with_target: false,
            file_enabled: false,
            log_dir: PathBuf::from("logs"),
            file_name: "repodump.log".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Applies `REPODUMP_LOG_*` variables. An unparsable format is ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var(ENV_LOG_LEVEL) {
            self.level = level;
        }
        if let Ok(format) = env::var(ENV_LOG_FORMAT) {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => eprintln!("Ignoring {ENV_LOG_FORMAT}: {e}"),
            }
        }
        if let Ok(dir) = env::var(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(dir);
        }
    }

    /// Adjusts the level from `-v`/`-q` counts.
    pub fn with_verbosity(
        mut self,
        verbose: u8,
        quiet: bool,
    ) -> Self {
        if quiet {
            self.level = "error".to_string();
        } else if verbose == 1 {
            self.level = "debug".to_string();
        } else if verbose > 1 {
            self.level = "trace".to_string();
        }
        self
    }

    pub fn validate(&self) -> RepodumpResult<()> {
        self.level
            .parse::<tracing::Level>()
            .map_err(|_| {
                repodump_error::GenericError::new(
                    StatusCode::InvalidArgs,
                    format!("invalid log level '{}'", self.level),
                )
            })
            .context("Validating logging config")?;
        ensure!(
            !self.file_enabled || !self.file_name.trim().is_empty(),
            StatusCode::InvalidArgs,
            "log file name cannot be empty"
        );
        Ok(())
    }

    /// Creates the log directory when the file sink is on.
    pub fn ensure_log_dir(&self) -> RepodumpResult<()> {
        if self.file_enabled {
            std::fs::create_dir_all(&self.log_dir)
                .with_context(|| format!("Creating log directory {}", self.log_dir.display()))?;
        }
        Ok(())
    }

    /// Filter directive: dependencies at `warn`, this crate at `level`.
    pub fn build_filter_directive(&self) -> String {
        let level = self.level.to_ascii_lowercase();
        format!("warn,repodump={level},repodump_error={level}")
    }
}
