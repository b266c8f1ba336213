//! Core library for Russian financial statement OCR processing.
//!
//! This crate provides:
//! - Loading of OCR output (JSON pages, quoted fragment dumps, plain lines)
//! - Token normalization for noisy OCR fragments
//! - Statement form detection (OKUD 0710001 balance sheet, 0710002 income statement)
//! - Reporting date inference for each value column
//! - Line-item extraction: accounting code, reporting date and sum
//!
//! The extractor itself is a pure function of its input pages; PDF
//! rasterization and OCR invocation live outside this crate.

pub mod codes;
pub mod error;
pub mod models;
pub mod ocr;
pub mod statement;

pub use codes::CodeList;
pub use error::{ExtractionError, InputError, OtchetError, Result};
pub use models::config::{DuplicatePolicy, ExtractionConfig, InputConfig, OtchetConfig};
pub use models::statement::{
    DateSource, ExtractionResult, LineItem, ReportingDate, ResolvedDate, Statement, StatementForm,
};
pub use ocr::{InputFormat, OcrDocument};
pub use statement::{StatementExtractor, StatementParser};
