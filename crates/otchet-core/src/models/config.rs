//! Configuration structures for the extraction pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ocr::InputFormat;

/// Main configuration for the otchet pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OtchetConfig {
    /// Statement extraction configuration.
    pub extraction: ExtractionConfig,

    /// OCR output loading configuration.
    pub input: InputConfig,
}

/// How repeated occurrences of the same code are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Every occurrence is emitted as its own group.
    #[default]
    Independent,
    /// Keep only the first occurrence.
    FirstWins,
    /// Keep only the last occurrence, at the position of the first.
    LastWins,
    /// Merge occurrences by adding their values column by column.
    Sum,
}

/// Statement extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How many tokens before a code are searched for its row label.
    pub lookback_window: usize,

    /// How many tokens after a code are searched for its values.
    pub lookahead_window: usize,

    /// How many tokens after a day/month phrase are searched for the year.
    pub year_search_window: usize,

    /// Upper bound on code groups collected per document.
    pub max_codes: usize,

    /// Upper bound on normalized tokens scanned per document.
    pub max_tokens: usize,

    /// Number of leading tokens attached to a failed extraction.
    pub diagnostics_limit: usize,

    /// Handling of repeated codes.
    pub duplicate_policy: DuplicatePolicy,

    /// End of the current reporting period; anchors the default dates.
    pub period_end: NaiveDate,

    /// Newline-delimited list of valid codes (allow-list).
    pub codes_file: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            lookback_window: 10,
            lookahead_window: 12,
            year_search_window: 5,
            max_codes: 500,
            max_tokens: 50_000,
            diagnostics_limit: 50,
            duplicate_policy: DuplicatePolicy::Independent,
            period_end: NaiveDate::from_ymd_opt(2024, 9, 30).unwrap_or_default(),
            codes_file: None,
        }
    }
}

/// OCR output loading configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Input format; `auto` sniffs the content.
    pub format: InputFormat,
}

impl OtchetConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
