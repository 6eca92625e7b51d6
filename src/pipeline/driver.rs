use std::{
    collections::HashMap,
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use repodump_error::{RepodumpResult, ResultExt, StackError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn};

use super::{aggregate::Aggregator, sink::FsSink};
use crate::{
    codec::{decode_with, normalize, DecodeOptions},
    repo::{ArchiveReader, Blockstore, Did, RecordEntry, Repository},
};

/// Target of stage transition events.
pub const PIPELINE_TARGET: &str = "repodump::pipeline";

/// Where a run is. Stages only move forward; `Failed` can follow any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    OpeningArchive,
    DerivingOutputRoot,
    Traversing,
    FlushingAggregates,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::OpeningArchive => "opening-archive",
            Stage::DerivingOutputRoot => "deriving-output-root",
            Stage::Traversing => "traversing",
            Stage::FlushingAggregates => "flushing-aggregates",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What to do with a record whose block does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Stop the run.
    #[default]
    Abort,
    /// Keep the raw block, log a warning and go on.
    Skip,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Parent of the output root; the root itself is named after the owner.
    pub output_dir: PathBuf,
    pub aggregate_dir: PathBuf,
    pub raw_extension: String,
    pub aggregate_extension: String,
    pub on_decode_error: DecodePolicy,
    pub decode: DecodeOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            aggregate_dir: PathBuf::from("."),
            raw_extension: super::sink::DEFAULT_RAW_EXTENSION.to_string(),
            aggregate_extension: super::sink::DEFAULT_AGGREGATE_EXTENSION.to_string(),
            on_decode_error: DecodePolicy::Abort,
            decode: DecodeOptions::default(),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub did: String,
    pub output_root: PathBuf,
    /// Records visited, skipped ones included.
    pub records_processed: usize,
    pub raw_files_written: usize,
    /// Aggregate files in the order they were written.
    pub aggregate_files: Vec<PathBuf>,
    /// Keys whose block failed to decode under [`DecodePolicy::Skip`].
    pub skipped_keys: Vec<String>,
}

/// Runs one export from an archive to the filesystem.
pub struct Pipeline<A: ArchiveReader> {
    reader: A,
    options: PipelineOptions,
    stage: Stage,
}

impl<A: ArchiveReader> Pipeline<A> {
    pub fn new(
        reader: A,
        options: PipelineOptions,
    ) -> Self {
        Self {
            reader,
            options,
            stage: Stage::Init,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Opens the archive file at `path` and runs.
    pub fn run_path(
        &mut self,
        path: &Path,
    ) -> RepodumpResult<RunReport> {
        let file = match File::open(path).with_context(|| format!("Opening archive {}", path.display())) {
            Ok(file) => file,
            Err(err) => {
                self.fail(err.clone());
                return Err(err);
            }
        };
        self.run(BufReader::new(file))
    }

    /// Runs the whole export from `source`.
    pub fn run<R: Read>(
        &mut self,
        source: R,
    ) -> RepodumpResult<RunReport> {
        let span = info_span!("pipeline", output_dir = %self.options.output_dir.display());
        let _enter = span.enter();

        match self.execute(source) {
            Ok(report) => {
                self.transition(Stage::Done);
                info!(
                    target: PIPELINE_TARGET,
                    did = %report.did,
                    records = report.records_processed,
                    raw_files = report.raw_files_written,
                    aggregates = report.aggregate_files.len(),
                    skipped = report.skipped_keys.len(),
                    "Export finished"
                );
                Ok(report)
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    fn transition(
        &mut self,
        next: Stage,
    ) {
        debug!(target: PIPELINE_TARGET, from = %self.stage, to = %next, "Stage transition");
        self.stage = next;
    }

    fn fail(
        &mut self,
        err: StackError,
    ) {
        error!(
            target: PIPELINE_TARGET,
            stage = %self.stage,
            status = %err.status_code(),
            error = %err,
            "Export failed"
        );
        self.transition(Stage::Failed);
    }

    fn execute<R: Read>(
        &mut self,
        source: R,
    ) -> RepodumpResult<RunReport> {
        self.transition(Stage::OpeningArchive);
        let repo = self.reader.open(source).context("Opening archive")?;

        self.transition(Stage::DerivingOutputRoot);
        let did = Did::parse(&repo.commit().did).context("Deriving output root")?;
        let sink = FsSink::new(
            self.options.output_dir.join(did.as_str()),
            &self.options.aggregate_dir,
        )
        .with_extensions(
            &self.options.raw_extension,
            &self.options.aggregate_extension,
        );
        sink.ensure_root().context("Deriving output root")?;
        info!(target: PIPELINE_TARGET, did = %did, root = %sink.output_root().display(), "Output root ready");

        self.transition(Stage::Traversing);
        let mut aggregator = Aggregator::new();
        let mut report = RunReport {
            did: did.to_string(),
            output_root: sink.output_root().to_path_buf(),
            records_processed: 0,
            raw_files_written: 0,
            aggregate_files: Vec::new(),
            skipped_keys: Vec::new(),
        };
        for entry in repo.entries() {
            let entry = entry.context("Traversing records")?;
            self.process_record(&repo, &sink, entry, &mut aggregator, &mut report)?;
        }
        info!(
            target: PIPELINE_TARGET,
            records = report.records_processed,
            types = aggregator.type_count(),
            "Traversal complete"
        );

        self.transition(Stage::FlushingAggregates);
        let mut written: HashMap<PathBuf, String> = HashMap::new();
        for (record_type, records) in aggregator.into_groups() {
            let path = sink.aggregate_path(&record_type);
            if let Some(previous) = written.get(&path) {
                warn!(
                    target: PIPELINE_TARGET,
                    path = %path.display(),
                    previous = %previous,
                    record_type = %record_type,
                    "Record types share an aggregate file, the later one replaces it"
                );
            }
            let path = sink
                .write_aggregate(&record_type, &records)
                .with_context(|| format!("Flushing aggregate '{record_type}'"))?;
            if written.insert(path.clone(), record_type).is_none() {
                report.aggregate_files.push(path);
            }
        }

        Ok(report)
    }

    /// Fetch, decode, persist and aggregate one record.
    fn process_record(
        &self,
        repo: &A::Repo,
        sink: &FsSink,
        entry: RecordEntry,
        aggregator: &mut Aggregator,
        report: &mut RunReport,
    ) -> RepodumpResult<()> {
        let RecordEntry { key, cid } = entry;
        report.records_processed += 1;

        let block = repo
            .blockstore()
            .get(&cid)
            .map_err(|e| e.with_key(&key))
            .with_context(|| format!("Fetching record '{key}'"))?;

        match decode_with(&block, &self.options.decode) {
            Ok(value) => {
                let document = normalize(value);
                sink.write_raw(&key, &block)
                    .with_context(|| format!("Writing record '{key}'"))?;
                report.raw_files_written += 1;
                let record_type = aggregator.push(key.clone(), document);
                debug!(key = %key, record_type = %record_type, "Record aggregated");
            }
            Err(err) => {
                let err = err.with_key(&key);
                match self.options.on_decode_error {
                    DecodePolicy::Abort => {
                        return Err(
                            StackError::from(err).context(format!("Decoding record '{key}'"))
                        );
                    }
                    DecodePolicy::Skip => {
                        warn!(key = %key, error = %err, "Skipping record that failed to decode");
                        sink.write_raw(&key, &block)
                            .with_context(|| format!("Writing record '{key}'"))?;
                        report.raw_files_written += 1;
                        report.skipped_keys.push(key);
                    }
                }
            }
        }
        Ok(())
    }
}
