//! Argument builders for the transcoder (`ffmpeg`) and the downloader (`yt-dlp`).
//!
//! Builders only produce argv vectors; running them is the job of a
//! [`ToolRunner`](crate::tool::ToolRunner).

use std::path::{Path, PathBuf};

use crate::opts::{ClipOpts, TranscodeOpts};

/// H.264 encoder used by the re-encode profile.
pub const VIDEO_CODEC: &str = "libx264";

/// 4:2:0 planar pixel format forced on re-encoded output.
pub const PIXEL_FORMAT: &str = "yuv420p";

/// `-loglevel` passed to every ffmpeg invocation.
const LOG_LEVEL: &str = "error";

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command that refuses to overwrite existing output.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: false,
        }
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Copy the video stream bit-for-bit instead of re-encoding.
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: impl Into<String>) -> Self {
        self.output_arg("-crf").output_arg(crf)
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    pub fn pixel_format(self, pix_fmt: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(pix_fmt)
    }

    /// Move the moov atom to the front so playback can start before the download finishes.
    pub fn fast_start(self) -> Self {
        self.output_arg("-movflags").output_arg("+faststart")
    }

    /// Drop every audio stream.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            LOG_LEVEL.to_string(),
        ];

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().into_owned());

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().into_owned());

        args
    }
}

/// The fixed re-encode profile: H.264 at the configured CRF/preset, yuv420p, fast-start,
/// no audio. Existing output is never overwritten.
pub fn transcode_command(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    opts: &TranscodeOpts,
) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .video_codec(VIDEO_CODEC)
        .preset(opts.preset.as_str())
        .crf(opts.crf.as_str())
        .pixel_format(PIXEL_FORMAT)
        .fast_start()
        .no_audio()
}

/// Remux `input` into `output` without re-encoding, dropping audio.
pub fn strip_audio_command(input: impl AsRef<Path>, output: impl AsRef<Path>) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .no_audio()
        .copy_video()
        .overwrite(true)
}

/// Builder for yt-dlp invocations that fetch a single trimmed clip.
#[derive(Debug, Clone)]
pub struct YtDlpCommand {
    url: String,
    output: PathBuf,
    format: Option<String>,
    section: Option<(u32, u32)>,
    no_playlist: bool,
}

impl YtDlpCommand {
    pub fn new(url: impl Into<String>, output: impl AsRef<Path>) -> Self {
        Self {
            url: url.into(),
            output: output.as_ref().to_path_buf(),
            format: None,
            section: None,
            no_playlist: false,
        }
    }

    /// Format selector passed to `-f`.
    pub fn format(mut self, selector: impl Into<String>) -> Self {
        self.format = Some(selector.into());
        self
    }

    /// Only download `[start, end)` seconds of the video.
    pub fn section(mut self, start_seconds: u32, end_seconds: u32) -> Self {
        self.section = Some((start_seconds, end_seconds));
        self
    }

    /// Download just the video the URL points at, never the surrounding playlist.
    pub fn no_playlist(mut self) -> Self {
        self.no_playlist = true;
        self
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(format) = &self.format {
            args.push("-f".to_string());
            args.push(format.clone());
        }

        args.push("--output".to_string());
        args.push(self.output.to_string_lossy().into_owned());

        // "*start-end" selects a time range rather than a chapter title.
        if let Some((start, end)) = self.section {
            args.push("--download-sections".to_string());
            args.push(format!("*{start}-{end}"));
        }

        if self.no_playlist {
            args.push("--no-playlist".to_string());
        }

        args.push(self.url.clone());
        args
    }
}

/// Best video-only stream no taller than `max_height` in the given container.
pub fn video_only_format(max_height: u32, container: &str) -> String {
    format!("bestvideo[height<={max_height}][ext={container}]")
}

/// The downloader invocation for one clip under `opts`, using `start_seconds` and
/// `duration_seconds` as the time window.
pub fn clip_download_command(
    url: &str,
    output: impl AsRef<Path>,
    start_seconds: u32,
    duration_seconds: u32,
    opts: &ClipOpts,
) -> YtDlpCommand {
    YtDlpCommand::new(url, output)
        .format(video_only_format(opts.max_height, &opts.container))
        .section(start_seconds, start_seconds.saturating_add(duration_seconds))
        .no_playlist()
}
