//! Per-item transcode state machine.
//!
//! For each [`WorkItem`] we end in exactly one terminal [`Outcome`]:
//! 1. source missing or not a regular file → `NotFound`
//! 2. destination already present → `Skipped`
//! 3. otherwise run the transcoder → `Succeeded` or `Failed`
//!
//! Step 2 is the resume mechanism: a rerun over a half-finished batch picks up where it
//! stopped. The existing output is trusted as-is, even if an earlier run was interrupted
//! while writing it.

use std::path::PathBuf;

use tracing::debug;

use crate::command::transcode_command;
use crate::discovery::WorkItem;
use crate::error::Result;
use crate::opts::TranscodeOpts;
use crate::tool::{FFMPEG, SystemToolRunner, ToolRunner, require_tool};

/// Why a transcode failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The transcoder process could not be started.
    Exception { message: String },

    /// The transcoder ran and exited unsuccessfully. Partial output is left on disk.
    NonZeroExit {
        exit_code: Option<i32>,
        stderr: String,
    },
}

impl FailureReason {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Exception { .. } => "exception",
            Self::NonZeroExit { .. } => "nonzero-exit",
        }
    }
}

/// Terminal state of one [`WorkItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Skipped,
    Failed(FailureReason),
    NotFound,
}

impl Outcome {
    /// `Failed` and `NotFound` both count against the run.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::NotFound)
    }

    /// Record tag used in the outcome log.
    pub fn log_tag(&self) -> &'static str {
        match self {
            Self::Succeeded => "SUCCEEDED",
            Self::Skipped => "SKIPPED",
            Self::NotFound => "NOT_FOUND",
            Self::Failed(FailureReason::Exception { .. }) => "EXCEPTION",
            Self::Failed(FailureReason::NonZeroExit { .. }) => "FAILED",
        }
    }
}

/// Runs the fixed re-encode profile over single work items.
pub struct Transcoder<R: ToolRunner = SystemToolRunner> {
    runner: R,
    opts: TranscodeOpts,
}

impl Transcoder<SystemToolRunner> {
    /// Create a transcoder that spawns the real `ffmpeg`.
    pub fn new(opts: TranscodeOpts) -> Self {
        Self::with_runner(SystemToolRunner, opts)
    }
}

impl<R: ToolRunner> Transcoder<R> {
    pub fn with_runner(runner: R, opts: TranscodeOpts) -> Self {
        Self { runner, opts }
    }

    /// Resolve the transcoder binary, failing with a configuration error if it is missing.
    pub fn preflight(&self) -> Result<PathBuf> {
        require_tool(&self.runner, FFMPEG)
    }

    /// Drive one item to its terminal outcome.
    pub fn run(&self, item: &WorkItem) -> Outcome {
        if !item.source_path().is_file() {
            return Outcome::NotFound;
        }

        if item.destination_path().exists() {
            return Outcome::Skipped;
        }

        let args =
            transcode_command(item.source_path(), item.destination_path(), &self.opts).build_args();
        debug!(source = %item.source_path().display(), "running transcoder");

        match self.runner.run(FFMPEG, &args) {
            Err(err) => Outcome::Failed(FailureReason::Exception {
                message: err.to_string(),
            }),
            Ok(output) if output.succeeded() => Outcome::Succeeded,
            Ok(output) => Outcome::Failed(FailureReason::NonZeroExit {
                exit_code: output.exit_code,
                stderr: output.stderr,
            }),
        }
    }

    pub fn opts(&self) -> &TranscodeOpts {
        &self.opts
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}
