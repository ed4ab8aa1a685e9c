// Download short, audio-free clips for every URL listed in a CSV file.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use vidbatch::clips::{DEFAULT_URL_COLUMN, DiscardedRow, plan_clip_tasks};
use vidbatch::opts::{
    DEFAULT_CLIP_CONTAINER, DEFAULT_CLIP_DURATION_SECONDS, DEFAULT_CLIP_MAX_HEIGHT,
    DEFAULT_CLIP_START_SECONDS,
};
use vidbatch::{ClipFetcher, ClipObserver, ClipOpts, ClipPlan, ClipTask, FetchError, SummaryFormat};

#[derive(Parser, Debug)]
#[command(name = "vidbatch-clips")]
#[command(about = "Fetch trimmed, video-only clips for a CSV list of URLs")]
struct Params {
    /// CSV file with a header row and one URL per row.
    #[arg(short = 'i', long = "csv", default_value = "youtube.csv")]
    csv: PathBuf,

    /// Header of the column holding the URLs.
    #[arg(short = 'c', long = "column", default_value = DEFAULT_URL_COLUMN)]
    column: String,

    /// Directory the clips are written to (created if missing).
    #[arg(short = 'o', long = "out", default_value = "downloads")]
    out: PathBuf,

    /// Seconds to skip at the start of each video.
    #[arg(long = "start", default_value_t = DEFAULT_CLIP_START_SECONDS)]
    start_seconds: u32,

    /// Clip length in seconds.
    #[arg(long = "duration", default_value_t = DEFAULT_CLIP_DURATION_SECONDS)]
    duration_seconds: u32,

    /// Maximum video height to download.
    #[arg(long = "max-height", default_value_t = DEFAULT_CLIP_MAX_HEIGHT)]
    max_height: u32,

    /// Container extension for downloads and output names.
    #[arg(long = "container", default_value = DEFAULT_CLIP_CONTAINER)]
    container: String,

    /// Format of the summary printed when the run finishes.
    #[arg(long = "summary-format", value_enum, default_value_t = SummaryFormat::Text)]
    summary_format: SummaryFormat,
}

fn main() -> Result<()> {
    vidbatch::logging::init();
    let params = Params::parse();

    let opts = ClipOpts {
        start_seconds: params.start_seconds,
        duration_seconds: params.duration_seconds,
        max_height: params.max_height,
        container: params.container.clone(),
    };

    let input = File::open(&params.csv)
        .with_context(|| format!("failed to open input table: {}", params.csv.display()))?;
    let plan = plan_clip_tasks(input, &params.column, &params.out, &opts.container)
        .with_context(|| format!("failed to read input table: {}", params.csv.display()))?;

    let fetcher = ClipFetcher::new(opts);
    let mut progress = ConsoleProgress::default();
    let summary = fetcher
        .run_batch(&plan, &mut progress)
        .context("clip run aborted")?;
    progress.finish();

    println!("{}", params.summary_format.render(&summary)?);
    Ok(())
}

/// Spinner with a running count plus per-row status lines.
struct ConsoleProgress {
    pb: ProgressBar,
    rows: usize,
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self {
            pb: ProgressBar::hidden(),
            rows: 0,
        }
    }
}

impl ConsoleProgress {
    fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl ClipObserver for ConsoleProgress {
    fn on_start(&mut self, plan: &ClipPlan) {
        self.rows = plan.rows;

        let style = ProgressStyle::with_template("{spinner:.green} {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        self.pb = ProgressBar::new(plan.tasks.len() as u64);
        self.pb.set_style(style);
    }

    fn on_discarded(&mut self, row: &DiscardedRow) {
        self.pb
            .println(format!("[{}] Skipped invalid link: {}", row.index, row.value));
    }

    fn on_task_start(&mut self, task: &ClipTask) {
        self.pb.set_message(format!(
            "[{}/{}] Downloading: {}",
            task.number(),
            self.rows,
            task.url
        ));
    }

    fn on_task_done(&mut self, task: &ClipTask, result: &std::result::Result<(), FetchError>) {
        match result {
            Ok(()) => self
                .pb
                .println(format!("   Saved: {}", task.output_path.display())),
            Err(err) => self
                .pb
                .println(format!("   FAILED: {} -> {err}", task.url)),
        }
        self.pb.inc(1);
    }
}
