//! `repodump` command line entry point.
//!
//! Reads a repository archive, writes every record as a raw block under
//! `<out>/<did>/` and one JSON collection per record type.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use repodump::{
    logging::{init_logging, LogFormat},
    CarReader, DecodePolicy, Pipeline, RunReport, Settings, StackError,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("REPODUMP_GIT_COMMIT"),
    ", built ",
    env!("REPODUMP_BUILD_TIME"),
    ")"
);

/// Command line arguments. Anything left unset falls back to the settings
/// file and `REPODUMP_*` variables.
#[derive(Parser)]
#[command(name = "repodump")]
#[command(version = env!("CARGO_PKG_VERSION"), long_version = LONG_VERSION)]
#[command(about = "Export the records of a repository CAR archive", long_about = None)]
struct Cli {
    /// Path to the CAR archive
    #[arg(help = "Path to the repository archive (default: repo.car)")]
    archive: Option<PathBuf>,
    /// Base directory for the per-identity raw output
    #[arg(short, long, help = "Directory under which <did>/ is created")]
    out: Option<PathBuf>,
    /// Directory for the per-type JSON collections
    #[arg(long, help = "Directory receiving the aggregated JSON files")]
    aggregate_dir: Option<PathBuf>,
    /// Settings file
    #[arg(
        short,
        long,
        env = "REPODUMP_CONFIG",
        help = "TOML settings file"
    )]
    config: Option<PathBuf>,
    /// Keep going past records that fail to decode
    #[arg(long, help = "Skip malformed records instead of aborting")]
    skip_malformed: bool,
    /// Check block digests while loading
    #[arg(long, help = "Verify every block against its CID digest")]
    verify_blocks: bool,
    /// Console log format
    #[arg(long, value_enum, help = "Log output format")]
    log_format: Option<LogFormatArg>,
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
    /// Only log errors
    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Only log errors"
    )]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Cli {
    fn apply(
        &self,
        settings: &mut Settings,
    ) {
        if let Some(archive) = &self.archive {
            settings.archive_path = archive.clone();
        }
        if let Some(out) = &self.out {
            settings.output_dir = out.clone();
        }
        if let Some(dir) = &self.aggregate_dir {
            settings.aggregate_dir = dir.clone();
        }
        if self.skip_malformed {
            settings.on_decode_error = DecodePolicy::Skip;
        }
        if self.verify_blocks {
            settings.verify_blocks = true;
        }
        if let Some(format) = self.log_format {
            settings.logging.format = format.into();
        }
        settings.logging = settings
            .logging
            .clone()
            .with_verbosity(self.verbose, self.quiet);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: &Cli) -> Result<RunReport> {
    let mut settings = Settings::load_from(cli.config.as_deref())?;
    cli.apply(&mut settings);
    settings.validate().context("Invalid command line")?;

    let logging = init_logging(settings.logging.clone())?;
    tracing::debug!(?settings, "Settings resolved");

    let reader = CarReader::new().verify_blocks(settings.verify_blocks);
    let mut pipeline = Pipeline::new(reader, settings.pipeline_options());
    let result = pipeline.run_path(&settings.archive_path);
    logging.shutdown();

    Ok(result?)
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StackError>())
        .map(|stack| u8::try_from(stack.exit_code()).unwrap_or(1))
        .unwrap_or(1)
}

fn print_summary(report: &RunReport) {
    println!(
        "Exported {} records of {} into {}",
        report.records_processed,
        report.did,
        report.output_root.display()
    );
    println!("  raw files:  {}", report.raw_files_written);
    for path in &report.aggregate_files {
        println!("  aggregate:  {}", path.display());
    }
    if !report.skipped_keys.is_empty() {
        println!("  skipped:    {}", report.skipped_keys.join(", "));
    }
}
