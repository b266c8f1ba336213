//! Statement data models: forms, reporting dates and line items.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Statement form, identified by its OKUD code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementForm {
    /// Balance sheet (бухгалтерский баланс), OKUD 0710001.
    Balance,
    /// Income statement (отчёт о финансовых результатах), OKUD 0710002.
    IncomeStatement,
    /// Form could not be identified.
    Unknown,
}

impl StatementForm {
    /// OKUD form code, if the form is known.
    pub fn okud_code(&self) -> Option<&'static str> {
        match self {
            StatementForm::Balance => Some("0710001"),
            StatementForm::IncomeStatement => Some("0710002"),
            StatementForm::Unknown => None,
        }
    }

    /// Parse a form from a token carrying an OKUD code.
    pub fn from_okud(token: &str) -> Option<Self> {
        if token.contains("0710001") {
            Some(StatementForm::Balance)
        } else if token.contains("0710002") {
            Some(StatementForm::IncomeStatement)
        } else {
            None
        }
    }

    /// Fixed number of value columns, or `None` when it has to be guessed.
    pub fn column_count(&self) -> Option<usize> {
        match self {
            StatementForm::Balance => Some(3),
            StatementForm::IncomeStatement => Some(2),
            StatementForm::Unknown => None,
        }
    }
}

impl fmt::Display for StatementForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementForm::Balance => write!(f, "balance (0710001)"),
            StatementForm::IncomeStatement => write!(f, "income statement (0710002)"),
            StatementForm::Unknown => write!(f, "unknown"),
        }
    }
}

/// Date attached to a value column.
///
/// Serialized as `YYYY-MM-DD`, or as a bare `YYYY` when only the year
/// could be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ReportingDate {
    /// Full calendar date.
    Date(NaiveDate),
    /// Year only (degraded).
    Year(i32),
}

impl ReportingDate {
    /// Create a full date, falling back to the bare year when the
    /// day/month combination does not exist.
    pub fn from_parts(year: i32, month: u32, day: u32) -> Self {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(ReportingDate::Date)
            .unwrap_or(ReportingDate::Year(year))
    }

    /// Year component.
    pub fn year(&self) -> i32 {
        match self {
            ReportingDate::Date(date) => date.year(),
            ReportingDate::Year(year) => *year,
        }
    }

    /// Calendar date used for ordering; a bare year counts as its last day.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ReportingDate::Date(date) => Some(*date),
            ReportingDate::Year(year) => NaiveDate::from_ymd_opt(*year, 12, 31),
        }
    }
}

impl fmt::Display for ReportingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportingDate::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            ReportingDate::Year(year) => write!(f, "{:04}", year),
        }
    }
}

impl FromStr for ReportingDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(ReportingDate::Date(date));
        }
        if s.len() == 4 {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(ReportingDate::Year(year));
            }
        }
        Err(format!("invalid reporting date: {}", s))
    }
}

impl From<ReportingDate> for String {
    fn from(date: ReportingDate) -> Self {
        date.to_string()
    }
}

impl TryFrom<String> for ReportingDate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Where a column date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// Read from the document.
    Resolved,
    /// Taken from the form defaults.
    Defaulted,
    /// Stepped back from the previous column.
    Synthesized,
}

/// A column date together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDate {
    pub date: ReportingDate,
    pub source: DateSource,
}

impl ResolvedDate {
    pub fn new(date: ReportingDate, source: DateSource) -> Self {
        Self { date, source }
    }
}

/// One extracted record: a code's sum for one reporting date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Reporting date of the column.
    pub date: ReportingDate,

    /// 4-5 digit accounting code.
    pub code: String,

    /// Signed sum; parenthesized source values are negative.
    pub sum: i64,
}

/// Full result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Detected statement form.
    pub form: StatementForm,

    /// Name of the strategy that decided the form.
    pub form_strategy: String,

    /// One date per value column, left to right.
    pub columns: Vec<ResolvedDate>,

    /// Line items, dense per code group.
    pub items: Vec<LineItem>,

    /// Non-fatal extraction warnings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Statement {
    /// Number of value columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Distinct codes in order of first appearance.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = Vec::new();
        for item in &self.items {
            if !codes.contains(&item.code.as_str()) {
                codes.push(&item.code);
            }
        }
        codes
    }

    /// All items for a code.
    pub fn items_for<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a LineItem> + 'a {
        self.items.iter().filter(move |item| item.code == code)
    }

    /// Sum for a code at a date (first group if the code repeats).
    pub fn sum_at(&self, code: &str, date: &ReportingDate) -> Option<i64> {
        self.items
            .iter()
            .find(|item| item.code == code && &item.date == date)
            .map(|item| item.sum)
    }
}

/// Wire-level extraction result consumed by the job layer.
///
/// Success: `{"items": [...]}`.
/// Failure: `{"error": "...", "items": [], "diagnostics": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub items: Vec<LineItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Vec<String>>,
}

impl ExtractionResult {
    /// Whether extraction succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl From<Statement> for ExtractionResult {
    fn from(statement: Statement) -> Self {
        Self {
            error: None,
            items: statement.items,
            diagnostics: None,
        }
    }
}

impl From<ExtractionError> for ExtractionResult {
    fn from(error: ExtractionError) -> Self {
        Self {
            error: Some(error.to_string()),
            items: Vec::new(),
            diagnostics: Some(error.diagnostics().to_vec()),
        }
    }
}

impl From<Result<Statement, ExtractionError>> for ExtractionResult {
    fn from(result: Result<Statement, ExtractionError>) -> Self {
        match result {
            Ok(statement) => statement.into(),
            Err(error) => error.into(),
        }
    }
}
