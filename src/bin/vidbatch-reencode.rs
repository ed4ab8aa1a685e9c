// Re-encode every video under a source tree into a mirrored destination tree with ffmpeg.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use vidbatch::opts::{DEFAULT_CRF, DEFAULT_EXTENSIONS, DEFAULT_PRESET};
use vidbatch::{
    FailureReason, Outcome, ReencodeObserver, Reencoder, SummaryFormat, TranscodeOpts, WorkItem,
};

#[derive(Parser, Debug)]
#[command(name = "vidbatch-reencode")]
#[command(about = "Re-encode a directory tree of videos to H.264, preserving folder structure")]
struct Params {
    /// Root of the tree to read videos from.
    #[arg(short = 's', long = "source")]
    source: PathBuf,

    /// Root of the mirrored output tree (created if missing).
    #[arg(short = 'd', long = "dest")]
    dest: PathBuf,

    /// Constant-rate-factor for the encoder.
    #[arg(long = "crf", default_value = DEFAULT_CRF)]
    crf: String,

    /// Encoder speed preset.
    #[arg(long = "preset", default_value = DEFAULT_PRESET)]
    preset: String,

    /// File extensions to re-encode (comma separated or repeated).
    #[arg(
        short = 'e',
        long = "ext",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_owned())
    )]
    extensions: Vec<String>,

    /// Where to write the outcome log. Defaults to `<dest>/reencode_log.txt`.
    #[arg(long = "log")]
    log: Option<PathBuf>,

    /// Format of the summary printed when the run finishes.
    #[arg(long = "summary-format", value_enum, default_value_t = SummaryFormat::Text)]
    summary_format: SummaryFormat,
}

fn main() -> Result<()> {
    vidbatch::logging::init();
    let params = Params::parse();

    let opts = TranscodeOpts {
        crf: params.crf.clone(),
        preset: params.preset.clone(),
        extensions: params.extensions.clone(),
    };

    let reencoder = Reencoder::new(opts);
    let mut progress = ConsoleProgress::new(&params.source);

    let report = reencoder
        .run_batch(
            &params.source,
            &params.dest,
            params.log.as_deref(),
            &mut progress,
        )
        .context("re-encode run aborted")?;
    progress.finish();

    println!("{}", params.summary_format.render(&report.summary)?);
    eprintln!("See log for details: {}", report.log_path.display());
    Ok(())
}

/// Progress bar plus one-line notices for failing items.
struct ConsoleProgress {
    source_root: PathBuf,
    pb: ProgressBar,
}

impl ConsoleProgress {
    fn new(source_root: &Path) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            pb: ProgressBar::hidden(),
        }
    }

    fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl ReencodeObserver for ConsoleProgress {
    fn on_start(&mut self, total: usize) {
        eprintln!(
            "Found {total} video files under: {}",
            self.source_root.display()
        );

        let style = ProgressStyle::with_template(
            "{msg} {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}<{eta_precise}]",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());

        self.pb = ProgressBar::new(total as u64);
        self.pb.set_style(style);
        self.pb.set_message("Re-encoding");
    }

    fn on_outcome(&mut self, item: &WorkItem, outcome: &Outcome) {
        if let Some(notice) = failure_notice(item, outcome) {
            self.pb.println(notice);
        }
        self.pb.inc(1);
    }
}

fn failure_notice(item: &WorkItem, outcome: &Outcome) -> Option<String> {
    let name = item
        .source_path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| item.source_path().display().to_string());

    match outcome {
        Outcome::Succeeded | Outcome::Skipped => None,
        Outcome::NotFound => Some(format!("Not found: {name}  (see log)")),
        Outcome::Failed(FailureReason::Exception { .. }) => Some(format!("Exception on {name}")),
        Outcome::Failed(FailureReason::NonZeroExit { .. }) => {
            Some(format!("Failed: {name}  (see log)"))
        }
    }
}
