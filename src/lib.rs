//! `vidbatch`: batch video processing on top of `ffmpeg` and `yt-dlp`.
//!
//! This crate provides:
//! - Re-encoding a directory tree into a mirrored destination tree, with skip-if-exists
//!   resume and a tab-delimited outcome log
//! - Fetching short, audio-free clips for a CSV list of video URLs
//! - An injectable process runner so both pipelines can be driven by a fake tool in tests
//!
//! Everything runs sequentially on the calling thread; each tool invocation blocks until it
//! exits.

// High-level pipelines (most consumers should start here).
pub mod clips;
pub mod reencode;

// Building blocks of the re-encode pipeline.
pub mod discovery;
pub mod outcome_log;
pub mod transcode;

// External tool plumbing.
pub mod command;
pub mod tool;

// Configuration and errors.
pub mod error;
pub mod opts;
pub mod summary_format;

// Logging configuration for binaries.
#[cfg(feature = "logging")]
pub mod logging;

pub use clips::{ClipFetcher, ClipObserver, ClipPlan, ClipSummary, ClipTask, FetchError};
pub use discovery::{WorkItem, discover};
pub use error::{Error, Result};
pub use opts::{ClipOpts, TranscodeOpts};
pub use outcome_log::{OutcomeLog, RunSummary};
pub use reencode::{ReencodeObserver, ReencodeReport, Reencoder};
pub use summary_format::SummaryFormat;
pub use tool::{SystemToolRunner, ToolOutput, ToolRunner};
pub use transcode::{FailureReason, Outcome, Transcoder};
