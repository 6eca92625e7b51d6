use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use repodump_error::{ensure, GenericError, RepodumpResult, ResultExt, StatusCode};
use serde::{Deserialize, Serialize};

use super::{CONFIG_PATH_ENV, ENV_PREFIX};
use crate::{
    codec::{DecodeOptions, DEFAULT_MAX_DEPTH},
    logging::LoggingConfig,
    pipeline::{DecodePolicy, PipelineOptions},
};

/// Run settings: defaults, then an optional TOML file, then `REPODUMP_*`
/// variables (`REPODUMP_LOG_*` for the logging table). Command-line flags are
/// applied on top by the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub archive_path: PathBuf,
    pub output_dir: PathBuf,
    pub aggregate_dir: PathBuf,
    pub raw_extension: String,
    pub aggregate_extension: String,
    pub on_decode_error: DecodePolicy,
    pub verify_blocks: bool,
    pub max_depth: usize,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            archive_path: PathBuf::from("repo.car"),
            output_dir: PathBuf::from("."),
            aggregate_dir: PathBuf::from("."),
            raw_extension: "cbor".to_string(),
            aggregate_extension: "json".to_string(),
            on_decode_error: DecodePolicy::Abort,
            verify_blocks: false,
            max_depth: DEFAULT_MAX_DEPTH,
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Loads settings, reading the file named by `REPODUMP_CONFIG` if set.
    pub fn load() -> RepodumpResult<Self> {
        let file = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Loads settings with an explicit config file.
    pub fn load_from(config_file: Option<&Path>) -> RepodumpResult<Self> {
        let mut settings = Self::build(config_file)
            .map_err(|e| GenericError::new(StatusCode::InvalidArgs, e.to_string()))
            .with_context(|| match config_file {
                Some(path) => format!("Loading settings from {}", path.display()),
                None => "Loading settings".to_string(),
            })?;
        settings.logging.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    fn build(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("archive_path", defaults.archive_path.to_string_lossy().as_ref())?
            .set_default("output_dir", defaults.output_dir.to_string_lossy().as_ref())?
            .set_default("aggregate_dir", defaults.aggregate_dir.to_string_lossy().as_ref())?
            .set_default("raw_extension", defaults.raw_extension)?
            .set_default("aggregate_extension", defaults.aggregate_extension)?
            .set_default("on_decode_error", "abort")?
            .set_default("verify_blocks", defaults.verify_blocks)?
            .set_default("max_depth", defaults.max_depth as u64)?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> RepodumpResult<()> {
        for (name, ext) in [
            ("raw_extension", &self.raw_extension),
            ("aggregate_extension", &self.aggregate_extension),
        ] {
            ensure!(
                !ext.is_empty(),
                StatusCode::InvalidArgs,
                "{} cannot be empty",
                name
            );
            ensure!(
                !ext.contains(['/', '\\', '.']),
                StatusCode::InvalidArgs,
                "{} '{}' must not contain dots or path separators",
                name,
                ext
            );
        }
        ensure!(
            self.max_depth > 0,
            StatusCode::InvalidArgs,
            "max_depth must be positive"
        );
        self.logging.validate()
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            output_dir: self.output_dir.clone(),
            aggregate_dir: self.aggregate_dir.clone(),
            raw_extension: self.raw_extension.clone(),
            aggregate_extension: self.aggregate_extension.clone(),
            on_decode_error: self.on_decode_error,
            decode: DecodeOptions {
                max_depth: self.max_depth,
            },
        }
    }
}
