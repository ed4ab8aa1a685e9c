use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use vidbatch::clips::{ClipPaths, DiscardedRow, StageFailure, plan_clip_tasks};
use vidbatch::tool::{FFMPEG, YT_DLP};
use vidbatch::{
    ClipFetcher, ClipObserver, ClipOpts, ClipSummary, ClipTask, FetchError, ToolOutput, ToolRunner,
};

/// Stand-in for yt-dlp and ffmpeg that writes the files each tool would produce.
struct FakeTools {
    installed: bool,
    /// URLs whose download exits non-zero.
    broken_urls: Vec<&'static str>,
    /// Whether the ffmpeg strip pass exits non-zero.
    strip_fails: bool,
    /// Whether ffmpeg reports success without writing its output.
    strip_writes_nothing: bool,
    calls: RefCell<Vec<(String, Vec<String>)>>,
}

impl FakeTools {
    fn new() -> Self {
        Self {
            installed: true,
            broken_urls: Vec::new(),
            strip_fails: false,
            strip_writes_nothing: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls_to(&self, program: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(p, _)| p == program)
            .count()
    }
}

impl ToolRunner for FakeTools {
    fn run(&self, program: &str, args: &[String]) -> io::Result<ToolOutput> {
        self.calls
            .borrow_mut()
            .push((program.to_owned(), args.to_vec()));

        match program {
            YT_DLP => {
                let url = args.last().expect("url is the last yt-dlp argument");
                if self.broken_urls.iter().any(|u| u == url) {
                    return Ok(ToolOutput::failure(1, "ERROR: [generic] Unable to download\n"));
                }
                let out_at = args
                    .iter()
                    .position(|a| a == "--output")
                    .expect("--output flag");
                fs::write(&args[out_at + 1], b"video+audio")?;
                Ok(ToolOutput::success())
            }
            FFMPEG => {
                if self.strip_fails {
                    return Ok(ToolOutput::failure(1, "Invalid data found when processing input\n"));
                }
                if self.strip_writes_nothing {
                    return Ok(ToolOutput::success());
                }
                let output = args.last().expect("ffmpeg output path");
                fs::write(output, b"video only")?;
                Ok(ToolOutput::success())
            }
            other => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("unexpected program {other}"),
            )),
        }
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.installed
            .then(|| PathBuf::from(format!("/usr/local/bin/{program}")))
    }
}

fn task(dir: &Path, index: usize, url: &str) -> ClipTask {
    ClipTask {
        index,
        url: url.to_owned(),
        output_path: dir.join(format!("video_{}.mp4", index + 1)),
    }
}

#[derive(Default)]
struct Events(Vec<String>);

impl ClipObserver for Events {
    fn on_discarded(&mut self, row: &DiscardedRow) {
        self.0.push(format!("discard {}", row.index));
    }

    fn on_task_done(&mut self, task: &ClipTask, result: &Result<(), FetchError>) {
        let status = match result {
            Ok(()) => "ok".to_owned(),
            Err(err) => err.stage().to_owned(),
        };
        self.0.push(format!("task {} {status}", task.index));
    }
}

#[test]
fn successful_fetch_replaces_download_with_silent_clip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tools = FakeTools::new();
    let fetcher = ClipFetcher::with_runner(&tools, ClipOpts::default());
    let task = task(dir.path(), 0, "https://example.com/watch?v=1");

    fetcher.fetch(&task, 10, 35)?;

    let paths = ClipPaths::for_output(&task.output_path);
    assert_eq!(fs::read(&task.output_path)?, b"video only");
    assert!(!paths.download.exists());
    assert!(!paths.silent.exists());
    assert_eq!(tools.calls_to(YT_DLP), 1);
    assert_eq!(tools.calls_to(FFMPEG), 1);

    let calls = tools.calls.borrow();
    let (_, ytdlp_args) = &calls[0];
    assert!(ytdlp_args.iter().any(|a| a == "*10-45"));
    assert!(ytdlp_args.iter().any(|a| a == "--no-playlist"));
    Ok(())
}

#[test]
fn strip_failure_leaves_download_behind() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tools = FakeTools {
        strip_fails: true,
        ..FakeTools::new()
    };
    let fetcher = ClipFetcher::with_runner(&tools, ClipOpts::default());
    let task = task(dir.path(), 4, "https://example.com/v");

    let err = fetcher.fetch(&task, 10, 35).unwrap_err();
    assert!(matches!(
        err,
        FetchError::Strip(StageFailure::Exit {
            exit_code: Some(1),
            ..
        })
    ));

    let paths = ClipPaths::for_output(&task.output_path);
    assert!(paths.download.exists());
    assert!(!task.output_path.exists());
    Ok(())
}

#[test]
fn download_failure_skips_strip_pass() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tools = FakeTools {
        broken_urls: vec!["https://example.com/gone"],
        ..FakeTools::new()
    };
    let fetcher = ClipFetcher::with_runner(&tools, ClipOpts::default());

    let err = fetcher
        .fetch(&task(dir.path(), 0, "https://example.com/gone"), 10, 35)
        .unwrap_err();
    assert_eq!(err.stage(), "download");
    assert!(err.to_string().contains("Unable to download"));
    assert_eq!(tools.calls_to(FFMPEG), 0);
    Ok(())
}

#[test]
fn missing_silent_file_fails_at_replace_stage() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let tools = FakeTools {
        strip_writes_nothing: true,
        ..FakeTools::new()
    };
    let fetcher = ClipFetcher::with_runner(&tools, ClipOpts::default());
    let task = task(dir.path(), 0, "https://example.com/v");

    let err = fetcher.fetch(&task, 10, 35).unwrap_err();
    assert_eq!(err.stage(), "replace");
    match &err {
        FetchError::Replace { path, .. } => assert_eq!(path, &task.output_path),
        other => panic!("expected replace failure, got {other:?}"),
    }
    assert!(!task.output_path.exists());
    Ok(())
}

#[test]
fn replace_failure_counts_as_failed_and_batch_moves_on() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("clips");
    let csv = "link\nhttps://example.com/a\nhttps://example.com/b\n";
    let plan = plan_clip_tasks(csv.as_bytes(), "link", &out, "mp4")?;

    let tools = FakeTools {
        strip_writes_nothing: true,
        ..FakeTools::new()
    };
    let mut events = Events::default();
    let summary =
        ClipFetcher::with_runner(&tools, ClipOpts::default()).run_batch(&plan, &mut events)?;

    assert_eq!(
        summary,
        ClipSummary {
            saved: 0,
            failed: 2,
            discarded: 0
        }
    );
    assert_eq!(events.0, vec!["task 0 replace", "task 1 replace"]);
    assert_eq!(tools.calls_to(YT_DLP), 2);
    assert_eq!(tools.calls_to(FFMPEG), 2);
    Ok(())
}

#[test]
fn invalid_rows_never_reach_the_tools() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("downloads");
    let csv = "link\nhttp://a/x\n\"\"\nnot-a-url\n";
    let plan = plan_clip_tasks(csv.as_bytes(), "link", &out, "mp4")?;

    assert_eq!(plan.tasks.len(), 1);
    assert_eq!(plan.tasks[0].index, 0);
    assert_eq!(plan.discarded.len(), 2);

    let tools = FakeTools::new();
    let fetcher = ClipFetcher::with_runner(&tools, ClipOpts::default());
    let mut events = Events::default();
    let summary = fetcher.run_batch(&plan, &mut events)?;

    assert_eq!(
        summary,
        ClipSummary {
            saved: 1,
            failed: 0,
            discarded: 2
        }
    );
    assert_eq!(tools.calls_to(YT_DLP), 1);
    assert_eq!(tools.calls_to(FFMPEG), 1);
    assert!(out.join("video_1.mp4").is_file());
    assert_eq!(events.0, vec!["task 0 ok", "discard 1", "discard 2"]);
    Ok(())
}

#[test]
fn batch_continues_after_a_failed_task() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("clips");
    let csv = "title,link\nfirst,https://example.com/gone\nsecond,oops\nthird,https://example.com/ok\n";
    let plan = plan_clip_tasks(csv.as_bytes(), "link", &out, "mp4")?;

    let tools = FakeTools {
        broken_urls: vec!["https://example.com/gone"],
        ..FakeTools::new()
    };
    let fetcher = ClipFetcher::with_runner(&tools, ClipOpts::default());
    let mut events = Events::default();
    let summary = fetcher.run_batch(&plan, &mut events)?;

    assert_eq!(
        summary,
        ClipSummary {
            saved: 1,
            failed: 1,
            discarded: 1
        }
    );
    assert_eq!(
        events.0,
        vec!["task 0 download", "discard 1", "task 2 ok"]
    );
    assert!(!out.join("video_1.mp4").exists());
    assert!(out.join("video_3.mp4").is_file());
    Ok(())
}

#[test]
fn missing_downloader_aborts_the_batch() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = "link\nhttps://example.com/a\n";
    let plan = plan_clip_tasks(csv.as_bytes(), "link", dir.path(), "mp4")?;

    let tools = FakeTools {
        installed: false,
        ..FakeTools::new()
    };
    let err = ClipFetcher::with_runner(&tools, ClipOpts::default())
        .run_batch(&plan, &mut ())
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("yt-dlp"));
    assert!(tools.calls.borrow().is_empty());
    Ok(())
}
