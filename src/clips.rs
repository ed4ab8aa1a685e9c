//! Clip fetching: download a short, video-only window of each remote video listed in a CSV,
//! then drop its audio with a codec-copy pass.
//!
//! Per task the steps are:
//! 1. `yt-dlp` writes the trimmed clip to `<stem>.download.<ext>`.
//! 2. `ffmpeg -an -c:v copy` remuxes it to `<stem>_silent.<ext>`.
//! 3. The download is deleted and the silent file renamed onto the task's output path.
//!
//! A failing step aborts only that task. Nothing is rolled back: a failed strip leaves the
//! downloaded file behind.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::command::{clip_download_command, strip_audio_command};
use crate::error::{Error, Result};
use crate::opts::ClipOpts;
use crate::tool::{FFMPEG, SystemToolRunner, ToolRunner, YT_DLP, require_tool};

/// Header of the CSV column holding URLs when none is configured.
pub const DEFAULT_URL_COLUMN: &str = "link";

/// URL schemes accepted for download.
const URL_SCHEMES: &[&str] = &["http://", "https://"];

/// One row of the input table that will be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipTask {
    /// 0-based position of the row in the table.
    pub index: usize,
    pub url: String,
    pub output_path: PathBuf,
}

impl ClipTask {
    /// 1-based row number, as used in output names.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// A row dropped before execution because its URL was empty or not http(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedRow {
    pub index: usize,
    pub value: String,
}

/// Tasks and discarded rows derived from one table, in row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipPlan {
    pub output_dir: PathBuf,
    pub tasks: Vec<ClipTask>,
    pub discarded: Vec<DiscardedRow>,
    /// Number of data rows read, excluding the header.
    pub rows: usize,
}

/// Whether `url` is non-empty and starts with a recognised scheme.
pub fn is_recognized_url(url: &str) -> bool {
    let url = url.trim();
    URL_SCHEMES.iter().any(|scheme| {
        url.len() > scheme.len()
            && url
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Output file name for the 1-based row `number`.
pub fn clip_file_name(number: usize, container: &str) -> String {
    format!("video_{number}.{container}")
}

/// Read a CSV table (with header row) and turn each row into a [`ClipTask`] or a
/// [`DiscardedRow`].
///
/// Returns [`Error::Configuration`] if `url_column` is not among the headers.
pub fn plan_clip_tasks<R: Read>(
    reader: R,
    url_column: &str,
    output_dir: &Path,
    container: &str,
) -> Result<ClipPlan> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let column = rdr
        .headers()?
        .iter()
        .position(|header| header.trim() == url_column)
        .ok_or_else(|| {
            Error::configuration(format!("input table has no `{url_column}` column"))
        })?;

    let mut plan = ClipPlan {
        output_dir: output_dir.to_path_buf(),
        tasks: Vec::new(),
        discarded: Vec::new(),
        rows: 0,
    };

    for (index, record) in rdr.records().enumerate() {
        let record = record?;
        plan.rows += 1;

        let url = record.get(column).unwrap_or("").trim();
        if is_recognized_url(url) {
            plan.tasks.push(ClipTask {
                index,
                url: url.to_owned(),
                output_path: output_dir.join(clip_file_name(index + 1, container)),
            });
        } else {
            plan.discarded.push(DiscardedRow {
                index,
                value: url.to_owned(),
            });
        }
    }

    Ok(plan)
}

/// How one tool invocation in the clip pipeline went wrong.
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error("could not start `{program}`: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {}: {}", describe_exit(.exit_code), last_line(.stderr))]
    Exit {
        program: &'static str,
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Why a clip task failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    Download(StageFailure),

    #[error("audio strip failed: {0}")]
    Strip(StageFailure),

    #[error("could not move clip into place at {}: {source}", .path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Download(_) => "download",
            Self::Strip(_) => "strip",
            Self::Replace { .. } => "replace",
        }
    }
}

fn report_discarded<O: ClipObserver + ?Sized>(row: &DiscardedRow, observer: &mut O) {
    info!(row = row.index, value = %row.value, "skipped invalid link");
    observer.on_discarded(row);
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_owned(),
    }
}

fn last_line(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no error output")
}

/// Temporary files used while fetching one clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipPaths {
    pub download: PathBuf,
    pub silent: PathBuf,
}

impl ClipPaths {
    pub fn for_output(output: &Path) -> Self {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = output
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        Self {
            download: output.with_file_name(format!("{stem}.download{ext}")),
            silent: output.with_file_name(format!("{stem}_silent{ext}")),
        }
    }
}

/// Tally for a clip batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClipSummary {
    pub saved: usize,
    pub failed: usize,
    pub discarded: usize,
}

impl fmt::Display for ClipSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SUMMARY: saved={}, failed={}, discarded={}",
            self.saved, self.failed, self.discarded
        )
    }
}

/// Progress hooks for a clip batch. All methods default to no-ops.
pub trait ClipObserver {
    fn on_start(&mut self, _plan: &ClipPlan) {}

    fn on_discarded(&mut self, _row: &DiscardedRow) {}

    fn on_task_start(&mut self, _task: &ClipTask) {}

    fn on_task_done(&mut self, _task: &ClipTask, _result: &std::result::Result<(), FetchError>) {}
}

impl ClipObserver for () {}

/// Fetches clips with `yt-dlp` and strips their audio with `ffmpeg`.
pub struct ClipFetcher<R: ToolRunner = SystemToolRunner> {
    runner: R,
    opts: ClipOpts,
}

impl ClipFetcher<SystemToolRunner> {
    pub fn new(opts: ClipOpts) -> Self {
        Self::with_runner(SystemToolRunner, opts)
    }
}

impl<R: ToolRunner> ClipFetcher<R> {
    pub fn with_runner(runner: R, opts: ClipOpts) -> Self {
        Self { runner, opts }
    }

    /// Both tools must resolve on `PATH` before any task runs.
    pub fn preflight(&self) -> Result<()> {
        require_tool(&self.runner, YT_DLP)?;
        require_tool(&self.runner, FFMPEG)?;
        Ok(())
    }

    /// Fetch one clip covering `[start_seconds, start_seconds + duration_seconds)`.
    ///
    /// On success the output path holds a video-only file and no temporary files remain.
    pub fn fetch(
        &self,
        task: &ClipTask,
        start_seconds: u32,
        duration_seconds: u32,
    ) -> std::result::Result<(), FetchError> {
        let paths = ClipPaths::for_output(&task.output_path);

        let download = clip_download_command(
            &task.url,
            &paths.download,
            start_seconds,
            duration_seconds,
            &self.opts,
        );
        self.invoke(YT_DLP, &download.build_args())
            .map_err(FetchError::Download)?;

        let strip = strip_audio_command(&paths.download, &paths.silent);
        self.invoke(FFMPEG, &strip.build_args())
            .map_err(FetchError::Strip)?;

        fs::remove_file(&paths.download).map_err(|source| FetchError::Replace {
            path: paths.download.clone(),
            source,
        })?;
        fs::rename(&paths.silent, &task.output_path).map_err(|source| FetchError::Replace {
            path: task.output_path.clone(),
            source,
        })?;

        Ok(())
    }

    /// Run every task in `plan` in order, using the configured time window.
    ///
    /// Per-task failures are reported to `observer` and counted; only preflight and output
    /// directory creation can fail the batch.
    pub fn run_batch<O: ClipObserver + ?Sized>(
        &self,
        plan: &ClipPlan,
        observer: &mut O,
    ) -> Result<ClipSummary> {
        self.preflight()?;
        fs::create_dir_all(&plan.output_dir)?;

        observer.on_start(plan);

        let mut summary = ClipSummary {
            discarded: plan.discarded.len(),
            ..ClipSummary::default()
        };

        // Rows are reported in table order, so discards are interleaved with tasks.
        let mut discarded = plan.discarded.iter().peekable();

        for task in &plan.tasks {
            while let Some(row) = discarded.next_if(|row| row.index < task.index) {
                report_discarded(row, &mut *observer);
            }

            observer.on_task_start(task);
            info!(row = task.index, url = %task.url, "fetching clip");

            let result = self.fetch(task, self.opts.start_seconds, self.opts.duration_seconds);
            match &result {
                Ok(()) => {
                    summary.saved += 1;
                    info!(output = %task.output_path.display(), "clip saved");
                }
                Err(err) => {
                    summary.failed += 1;
                    warn!(url = %task.url, stage = err.stage(), error = %err, "clip failed");
                }
            }
            observer.on_task_done(task, &result);
        }

        for row in discarded {
            report_discarded(row, &mut *observer);
        }

        Ok(summary)
    }

    fn invoke(
        &self,
        program: &'static str,
        args: &[String],
    ) -> std::result::Result<(), StageFailure> {
        let output = self
            .runner
            .run(program, args)
            .map_err(|source| StageFailure::Spawn { program, source })?;

        if output.succeeded() {
            Ok(())
        } else {
            Err(StageFailure::Exit {
                program,
                exit_code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }
}
