//! High-level API for re-encoding a directory tree.
//!
//! [`Reencoder`] wires the pieces together for one run:
//! preflight (transcoder on `PATH`) → discovery → fresh outcome log → one transcode per item
//! → summary line.
//!
//! Fatal problems (missing tool, bad source root, nothing to do) come back as `Err` before any
//! item is touched. Per-item failures are recorded and the run continues.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::discovery::{WorkItem, discover};
use crate::error::Result;
use crate::opts::TranscodeOpts;
use crate::outcome_log::{OutcomeLog, RunSummary};
use crate::tool::{SystemToolRunner, ToolRunner};
use crate::transcode::{FailureReason, Outcome, Transcoder};

/// File name of the log written into the destination root when no explicit path is given.
pub const DEFAULT_LOG_FILE_NAME: &str = "reencode_log.txt";

/// Progress hooks for a re-encode run.
///
/// Every method has a no-op default so frontends only implement what they display.
pub trait ReencodeObserver {
    /// Called once after discovery with the number of items about to be processed.
    fn on_start(&mut self, _total: usize) {}

    /// Called after each item reaches its terminal outcome.
    fn on_outcome(&mut self, _item: &WorkItem, _outcome: &Outcome) {}
}

impl ReencodeObserver for () {}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReencodeReport {
    pub summary: RunSummary,
    pub log_path: PathBuf,
}

/// The main re-encode entry point.
///
/// Construct once with the options, then call [`Reencoder::run_batch`].
pub struct Reencoder<R: ToolRunner = SystemToolRunner> {
    transcoder: Transcoder<R>,
}

impl Reencoder<SystemToolRunner> {
    pub fn new(opts: TranscodeOpts) -> Self {
        Self::with_runner(SystemToolRunner, opts)
    }
}

impl<R: ToolRunner> Reencoder<R> {
    /// Create a re-encoder that invokes tools through `runner`.
    pub fn with_runner(runner: R, opts: TranscodeOpts) -> Self {
        Self {
            transcoder: Transcoder::with_runner(runner, opts),
        }
    }

    /// Re-encode every matching file under `source_root` into `destination_root`.
    ///
    /// The log goes to `log_path`, or `destination_root/reencode_log.txt` when `None`.
    /// The log file is truncated at the start of the run and closed when this returns.
    pub fn run_batch<O: ReencodeObserver + ?Sized>(
        &self,
        source_root: &Path,
        destination_root: &Path,
        log_path: Option<&Path>,
        observer: &mut O,
    ) -> Result<ReencodeReport> {
        let ffmpeg = self.transcoder.preflight()?;
        info!(ffmpeg = %ffmpeg.display(), "transcoder located");

        let items = discover(
            source_root,
            destination_root,
            &self.transcoder.opts().extensions,
        )?;
        info!(
            count = items.len(),
            source_root = %source_root.display(),
            "discovered video files"
        );

        let log_path = log_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| destination_root.join(DEFAULT_LOG_FILE_NAME));
        let mut log = OutcomeLog::create(&log_path)?;

        let summary = self.process(&items, &mut log, observer)?;
        info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            log = %log_path.display(),
            "re-encode run finished"
        );

        Ok(ReencodeReport { summary, log_path })
    }

    /// Process an already-discovered worklist, strictly in order.
    ///
    /// Every item is recorded in `log` exactly once; the summary line is written at the end.
    pub fn process<W, O>(
        &self,
        items: &[WorkItem],
        log: &mut OutcomeLog<W>,
        observer: &mut O,
    ) -> Result<RunSummary>
    where
        W: Write,
        O: ReencodeObserver + ?Sized,
    {
        observer.on_start(items.len());

        let mut summary = RunSummary::default();
        for item in items {
            let outcome = self.transcoder.run(item);
            trace_outcome(item, &outcome);

            log.record(item, &outcome)?;
            summary.record(&outcome);
            observer.on_outcome(item, &outcome);
        }

        log.finalize(&summary)?;
        Ok(summary)
    }
}

fn trace_outcome(item: &WorkItem, outcome: &Outcome) {
    let source = item.source_path().display();
    match outcome {
        Outcome::Succeeded => info!(source = %source, "re-encoded"),
        Outcome::Skipped => info!(source = %source, "destination exists, skipped"),
        Outcome::NotFound => warn!(source = %source, "source vanished before processing"),
        Outcome::Failed(FailureReason::Exception { message }) => {
            warn!(source = %source, error = %message, "transcoder could not be started")
        }
        Outcome::Failed(FailureReason::NonZeroExit { exit_code, .. }) => {
            warn!(source = %source, exit_code = ?exit_code, "transcoder failed")
        }
    }
}
