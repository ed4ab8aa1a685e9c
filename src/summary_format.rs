use std::fmt::Display;

use serde::Serialize;

use crate::error::Result;

/// How a binary prints its end-of-run summary to stdout.
///
/// - `ValueEnum` (behind the `cli` feature) lets clap parse this straight from a flag.
/// - The outcome log always uses the text form; this only affects console output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SummaryFormat {
    /// `SUMMARY: key=value, ...`
    #[default]
    Text,

    /// A single JSON object with one numeric field per counter.
    Json,
}

impl SummaryFormat {
    pub fn render<T: Serialize + Display>(self, summary: &T) -> Result<String> {
        match self {
            Self::Text => Ok(summary.to_string()),
            Self::Json => Ok(serde_json::to_string(summary)?),
        }
    }
}
