use thiserror::Error;

/// vidbatch's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// vidbatch's crate-wide error type.
///
/// Only run-level problems surface here. Per-item failures (a transcode that exits non-zero,
/// a clip whose download fails) are reported as values so a batch can keep going.
#[derive(Debug, Error)]
pub enum Error {
    /// A fatal preflight problem: missing tool binary, bad source root, no input files,
    /// malformed tabular input. Nothing has been processed when this is returned.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An unexpected run-level failure that fits no other variant.
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Whether this error is a fatal configuration problem rather than an I/O failure mid-run.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_tagged_and_prefixed() {
        let err = Error::configuration("ffmpeg not found");
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "configuration error: ffmpeg not found");

        let io = Error::from(std::io::Error::other("disk full"));
        assert!(!io.is_configuration());
        assert_eq!(io.to_string(), "disk full");
    }
}
