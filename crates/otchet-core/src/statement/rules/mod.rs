//! Rule-based token classifiers for Russian financial statements.
//!
//! Each pipeline stage that can decide in more than one way exposes its
//! alternatives as named [`Strategy`] values tried in priority order.

pub mod amounts;
pub mod associate;
pub mod dates;
pub mod form;
pub mod normalize;
pub mod patterns;

pub use amounts::{parse_sum, ParsedSum};
pub use associate::{apply_duplicate_policy, Association, Associator, CodeGroup};
pub use dates::{month_number, resolve_dates, DateContext};
pub use form::{classify_form, FormDecision};
pub use normalize::{clean_token, TokenStream};

use patterns::{CODE_TOKEN, YEAR_TOKEN};

/// One way of deciding something about a token stream.
pub trait Strategy {
    /// The decided value.
    type Output;

    /// Stable name, reported in logs and in the extraction result.
    fn name(&self) -> &'static str;

    /// Try this strategy; `None` hands over to the next one.
    fn apply(&self, tokens: &TokenStream) -> Option<ExtractionMatch<Self::Output>>;
}

/// Run strategies in order and return the first match.
pub fn first_match<T>(
    strategies: &[&dyn Strategy<Output = T>],
    tokens: &TokenStream,
) -> Option<ExtractionMatch<T>> {
    strategies.iter().find_map(|strategy| strategy.apply(tokens))
}

/// A decided value together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Name of the strategy that produced it.
    pub strategy: &'static str,
    /// Index of the deciding token, if a single token decided it.
    pub position: Option<usize>,
    /// Token text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, strategy: &'static str, source: impl Into<String>) -> Self {
        Self {
            value,
            strategy,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

/// Token is exactly 4-5 digits.
pub fn is_code_shaped(token: &str) -> bool {
    CODE_TOKEN.is_match(token)
}

/// Year in the range codes must not be confused with.
pub fn year_value(token: &str) -> Option<i32> {
    let caps = YEAR_TOKEN.captures(token)?;
    let year: i32 = caps[1].parse().ok()?;
    (1900..=2100).contains(&year).then_some(year)
}

/// A 4-digit token that reads as a calendar year (1900-2100).
pub fn is_year_like(token: &str) -> bool {
    token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()) && year_value(token).is_some()
}

/// Token carries letters (any script) or mojibake replacement glyphs.
pub fn is_descriptive(token: &str) -> bool {
    token.chars().any(|c| c.is_alphabetic() || c == '\u{fffd}')
}

/// Letters outside ASCII, or replacement glyphs.
///
/// Cyrillic decoded through a single-byte codepage keeps non-ASCII
/// letters (`Ð`, `Ñ`), so such mojibake still counts.
pub fn has_native_text(token: &str) -> bool {
    token
        .chars()
        .any(|c| (c.is_alphabetic() && !c.is_ascii()) || c == '\u{fffd}')
}

/// Table scaffolding: column labels, section headers and date-header prefixes.
pub fn is_structural(token: &str) -> bool {
    let lower = token.to_lowercase();
    token.contains("АКТИВ")
        || token.contains("ПАССИВ")
        || token.starts_with("На ")
        || token.starts_with("За ")
        || lower.contains("код")
        || lower.contains("code")
        || lower.starts_with("пояснени")
        || lower.starts_with("наименование показател")
}
