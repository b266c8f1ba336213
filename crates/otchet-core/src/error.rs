//! Error types for the otchet-core library.

use thiserror::Error;

/// Main error type for the otchet library.
#[derive(Error, Debug)]
pub enum OtchetError {
    /// Statement extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// OCR output could not be read.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to reading OCR output.
#[derive(Error, Debug)]
pub enum InputError {
    /// The JSON document could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON parsed but has no recognizable page layout.
    #[error("unsupported OCR output shape: {0}")]
    UnsupportedShape(String),

    /// The input holds no text fragments at all.
    #[error("no text fragments found")]
    NoFragments,
}

/// Errors raised by the statement extractor.
///
/// Both variants are recoverable: the caller reports them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Normalization left nothing to scan.
    #[error("no valid lines found")]
    EmptyInput,

    /// Tokens were present but no code/value association survived.
    #[error("Не удалось извлечь структурированные данные из документа")]
    NoStructuredData {
        /// Leading normalized tokens, kept for manual inspection.
        diagnostics: Vec<String>,
    },
}

impl ExtractionError {
    /// Diagnostic tokens carried by the error, if any.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            ExtractionError::EmptyInput => &[],
            ExtractionError::NoStructuredData { diagnostics } => diagnostics,
        }
    }
}

/// Result type for the otchet library.
pub type Result<T> = std::result::Result<T, OtchetError>;
