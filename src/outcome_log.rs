use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::discovery::WorkItem;
use crate::error::{Error, Result};
use crate::transcode::{FailureReason, Outcome};

/// Per-run tally of outcomes.
///
/// `NotFound` is counted under `failed`, so the three counters always add up to the number
/// of items processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Succeeded => self.succeeded += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed(_) | Outcome::NotFound => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SUMMARY: succeeded={}, skipped={}, failed={}",
            self.succeeded, self.skipped, self.failed
        )
    }
}

/// Append-only, tab-delimited outcome log.
///
/// Design:
/// - One record per line: `KIND\tsource_path[\tdetail...]`.
/// - Detail text (error messages, ffmpeg stderr) is escaped so a record never spans lines.
/// - Every record is flushed as it is written, so an interrupted run still leaves a usable log.
/// - `finalize` writes the `SUMMARY:` line and closes the log; further records are rejected.
pub struct OutcomeLog<W: Write> {
    /// The underlying writer we stream records into.
    w: W,

    /// Whether the summary line has been written.
    closed: bool,
}

impl OutcomeLog<BufWriter<File>> {
    /// Create (or truncate) the log file at `path`, creating its parent directory if needed.
    ///
    /// Counts are never carried over from an earlier run's log.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> OutcomeLog<W> {
    pub fn new(w: W) -> Self {
        Self { w, closed: false }
    }

    /// Append the record for one item.
    pub fn record(&mut self, item: &WorkItem, outcome: &Outcome) -> Result<()> {
        if self.closed {
            return Err(Error::msg("cannot record outcome: log is already finalized"));
        }

        writeln!(&mut self.w, "{}", format_record(item, outcome))?;
        self.w.flush()?;
        Ok(())
    }

    /// Append the summary line and flush. This is idempotent.
    pub fn finalize(&mut self, summary: &RunSummary) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        writeln!(&mut self.w, "{summary}")?;
        self.w.flush()?;
        self.closed = true;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.w
    }
}

fn format_record(item: &WorkItem, outcome: &Outcome) -> String {
    let tag = outcome.log_tag();
    let source = escape_field(&item.source_path().display().to_string());

    match outcome {
        Outcome::Succeeded | Outcome::Skipped | Outcome::NotFound => format!("{tag}\t{source}"),
        Outcome::Failed(FailureReason::Exception { message }) => {
            format!("{tag}\t{source}\t{}", escape_field(message))
        }
        Outcome::Failed(FailureReason::NonZeroExit { exit_code, stderr }) => {
            let code = match exit_code {
                Some(code) => code.to_string(),
                None => "signal".to_owned(),
            };
            format!(
                "{tag}\t{source}\treturncode={code}\t{}",
                escape_field(stderr.trim())
            )
        }
    }
}

/// Escape backslashes, newlines and tabs; drop carriage returns.
fn escape_field(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}
