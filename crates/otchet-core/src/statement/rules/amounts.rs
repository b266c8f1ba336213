//! Sum parsing for statement value cells.

use super::patterns::GROUPED_NUMBER;

/// A parsed value cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedSum {
    /// A number read from the cell.
    Value(i64),
    /// A dash or dot standing in for an empty cell; counts as zero.
    Placeholder,
}

impl ParsedSum {
    pub fn value(self) -> i64 {
        match self {
            ParsedSum::Value(v) => v,
            ParsedSum::Placeholder => 0,
        }
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, ParsedSum::Placeholder)
    }
}

const DASHES: [char; 6] = ['\u{2010}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2212}'];

/// Parse an OCR'd value cell.
///
/// Russian statements print thousands with spaces ("37 992"), negatives in
/// parentheses ("(1 200)") and empty cells as a dash. Returns `None` for
/// anything that does not read as an integer.
pub fn parse_sum(token: &str) -> Option<ParsedSum> {
    let mut s: String = token
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if DASHES.contains(&c) { '-' } else { c })
        .collect();

    if s.is_empty() {
        return None;
    }

    if s.len() <= 3 && s.chars().all(|c| c == '-' || c == '.') {
        return Some(ParsedSum::Placeholder);
    }

    // One trailing punctuation artifact ("1 234.", "500,")
    if s.ends_with(['.', ',', ';', ':', '\'', '"', '`']) {
        s.pop();
    }

    let mut negative = false;
    let mut body = s.as_str();
    if body.starts_with('(') || body.ends_with(')') {
        negative = true;
        body = body.trim_start_matches('(').trim_end_matches(')');
    }
    if let Some(rest) = body.strip_prefix('-') {
        negative = !negative;
        body = rest;
    }

    let digits = if GROUPED_NUMBER.is_match(body) {
        body.replace(['.', ','], "")
    } else {
        body.to_string()
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let value: i64 = digits.parse().ok()?;
    Some(ParsedSum::Value(if negative { -value } else { value }))
}
