//! Statement line-item extraction.

mod parser;
pub mod rules;

pub use parser::StatementParser;

use crate::error::ExtractionError;
use crate::models::statement::Statement;
use crate::ocr::OcrDocument;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for statement extractors.
pub trait StatementExtractor {
    /// Extract line items from OCR pages, each an ordered list of fragments.
    fn extract(&self, pages: &[Vec<String>]) -> Result<Statement>;

    /// Extract line items from plain text, one fragment per line.
    fn extract_from_text(&self, text: &str) -> Result<Statement>;

    /// Extract line items from a loaded OCR document.
    fn extract_document(&self, document: &OcrDocument) -> Result<Statement> {
        self.extract(&document.pages)
    }
}
