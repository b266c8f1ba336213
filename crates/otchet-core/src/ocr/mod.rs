//! OCR output loading.
//!
//! PDF rasterization and text recognition run outside this crate. This
//! module only reads what the recognizer wrote and turns it into the
//! page/fragment shape the extractor consumes.

mod json;
mod text;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InputError;

/// Result type for OCR output loading.
pub type Result<T> = std::result::Result<T, InputError>;

/// Layout of an OCR output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// Sniff the content.
    #[default]
    Auto,
    /// JSON pages or recognizer page objects.
    Json,
    /// Single-quoted fragments, as printed by a JS-like array dump.
    Quoted,
    /// One fragment per line, form feed between pages.
    Lines,
}

/// A recognized word with its confidence, as emitted by PaddleOCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    /// Recognized text.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    #[serde(default)]
    pub confidence: f32,
}

/// OCR output of a whole document: raw fragments grouped by page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrDocument {
    pub pages: Vec<Vec<String>>,
}

impl OcrDocument {
    /// Wrap already-split pages.
    pub fn new(pages: Vec<Vec<String>>) -> Self {
        Self { pages }
    }

    /// Parse OCR output text in the given format.
    pub fn parse(content: &str, format: InputFormat) -> Result<Self> {
        let format = match format {
            InputFormat::Auto => detect_format(content),
            other => other,
        };
        debug!("Reading OCR output as {:?}", format);

        let pages = match format {
            InputFormat::Json => json::pages_from_str(content)?,
            InputFormat::Quoted => text::pages_from_quoted(content),
            InputFormat::Lines | InputFormat::Auto => text::pages_from_lines(content),
        };

        let document = Self { pages };
        if document.fragment_count() == 0 {
            return Err(InputError::NoFragments);
        }
        Ok(document)
    }

    /// Read and parse an OCR output file.
    pub fn from_file(path: &Path, format: InputFormat) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content, format)?)
    }

    /// Total number of raw fragments across pages.
    pub fn fragment_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl From<Vec<Vec<String>>> for OcrDocument {
    fn from(pages: Vec<Vec<String>>) -> Self {
        Self::new(pages)
    }
}

/// Guess the layout of an OCR output file.
pub fn detect_format(content: &str) -> InputFormat {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if (trimmed.starts_with('[') || trimmed.starts_with('{')) && json::looks_like_json(trimmed) {
        InputFormat::Json
    } else if text::is_quoted_dump(trimmed) {
        InputFormat::Quoted
    } else {
        InputFormat::Lines
    }
}
