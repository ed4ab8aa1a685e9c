//! Process execution for the external tools.
//!
//! Everything vidbatch does to a video happens inside `ffmpeg` or `yt-dlp`. We talk to them
//! through [`ToolRunner`] so the pipelines can be exercised with a scripted fake in tests,
//! while [`SystemToolRunner`] spawns the real binaries.

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// Program name of the transcoder.
pub const FFMPEG: &str = "ffmpeg";

/// Program name of the downloader.
pub const YT_DLP: &str = "yt-dlp";

/// Exit status and diagnostics of one finished tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Process exit code. `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,

    /// Everything the tool wrote to standard error, decoded lossily as UTF-8.
    pub stderr: String,
}

impl ToolOutput {
    /// A clean exit with no diagnostics.
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            stderr: String::new(),
        }
    }

    /// A non-zero exit carrying the given stderr text.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stderr: stderr.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs an external program to completion.
///
/// Implementations block until the program exits. An `Err` means the process could not be
/// started at all; a started process that fails is an `Ok` with a non-zero exit code.
pub trait ToolRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<ToolOutput>;

    /// Resolve `program` on the search path.
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, program: &str, args: &[String]) -> io::Result<ToolOutput> {
        (**self).run(program, args)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        (**self).locate(program)
    }
}

/// [`ToolRunner`] that spawns real processes.
///
/// stdin is closed and stdout discarded; only stderr is captured for diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<ToolOutput> {
        debug!(program, args = ?args, "spawning external tool");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Fail fast with a configuration error unless `program` resolves on the search path.
pub fn require_tool<R: ToolRunner + ?Sized>(runner: &R, program: &str) -> Result<PathBuf> {
    runner.locate(program).ok_or_else(|| {
        Error::configuration(format!(
            "`{program}` not found in PATH; install it and add it to PATH, then re-run"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NothingInstalled;

    impl ToolRunner for NothingInstalled {
        fn run(&self, _program: &str, _args: &[String]) -> io::Result<ToolOutput> {
            Ok(ToolOutput::success())
        }

        fn locate(&self, _program: &str) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn require_tool_reports_missing_binary_as_configuration_error() {
        let err = require_tool(&NothingInstalled, FFMPEG).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("`ffmpeg` not found in PATH"));
    }

    #[test]
    fn system_runner_reports_spawn_failure_as_err() {
        let res = SystemToolRunner.run("vidbatch-no-such-tool-7f3a", &[]);
        assert!(res.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_exit_code_and_stderr() -> anyhow::Result<()> {
        let args = vec!["-c".to_owned(), "echo boom >&2; exit 3".to_owned()];
        let out = SystemToolRunner.run("sh", &args)?;
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.succeeded());
        assert_eq!(out.stderr.trim(), "boom");
        Ok(())
    }

    #[test]
    fn only_exit_code_zero_counts_as_success() {
        assert!(ToolOutput::success().succeeded());
        assert!(!ToolOutput::failure(1, "").succeeded());
        let signalled = ToolOutput {
            exit_code: None,
            stderr: String::new(),
        };
        assert!(!signalled.succeeded());
    }
}
