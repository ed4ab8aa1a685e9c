/// Options for the re-encode pipeline.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI maps user input into this type so that other frontends (tests, other batch
/// drivers) can construct options programmatically.
///
/// The video codec, pixel format, fast-start flag and audio removal are fixed parts of the
/// transcode profile; only the knobs below vary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOpts {
    /// Constant-rate-factor passed to the encoder (lower is higher quality).
    pub crf: String,

    /// Named encoder speed preset (e.g. `"fast"`, `"medium"`).
    pub preset: String,

    /// File extensions to pick up during discovery, without the leading dot.
    ///
    /// Matching is ASCII case-insensitive, so `"mp4"` also matches `CLIP.MP4`.
    pub extensions: Vec<String>,
}

pub const DEFAULT_CRF: &str = "23";
pub const DEFAULT_PRESET: &str = "fast";
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi"];

impl Default for TranscodeOpts {
    fn default() -> Self {
        Self {
            crf: DEFAULT_CRF.to_owned(),
            preset: DEFAULT_PRESET.to_owned(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_owned()).collect(),
        }
    }
}

/// Options for the clip-fetch pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipOpts {
    /// Offset into the remote video where the clip starts, in seconds.
    pub start_seconds: u32,

    /// Clip length in seconds.
    pub duration_seconds: u32,

    /// Highest acceptable video height for the downloader's format selector.
    pub max_height: u32,

    /// Container extension requested from the downloader and used for output names.
    pub container: String,
}

pub const DEFAULT_CLIP_START_SECONDS: u32 = 10;
pub const DEFAULT_CLIP_DURATION_SECONDS: u32 = 35;
pub const DEFAULT_CLIP_MAX_HEIGHT: u32 = 360;
pub const DEFAULT_CLIP_CONTAINER: &str = "mp4";

impl Default for ClipOpts {
    fn default() -> Self {
        Self {
            start_seconds: DEFAULT_CLIP_START_SECONDS,
            duration_seconds: DEFAULT_CLIP_DURATION_SECONDS,
            max_height: DEFAULT_CLIP_MAX_HEIGHT,
            container: DEFAULT_CLIP_CONTAINER.to_owned(),
        }
    }
}

impl ClipOpts {
    /// End of the requested time range, in seconds.
    pub fn end_seconds(&self) -> u32 {
        self.start_seconds.saturating_add(self.duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcode_defaults_match_the_documented_profile() {
        let opts = TranscodeOpts::default();
        assert_eq!(opts.crf, "23");
        assert_eq!(opts.preset, "fast");
        assert_eq!(opts.extensions, vec!["mp4", "mkv", "avi"]);
    }

    #[test]
    fn clip_window_ends_after_start_plus_duration() {
        let opts = ClipOpts::default();
        assert_eq!(opts.end_seconds(), 45);

        let saturating = ClipOpts {
            start_seconds: u32::MAX,
            ..ClipOpts::default()
        };
        assert_eq!(saturating.end_seconds(), u32::MAX);
    }
}
