//! Code/value association over the normalized token stream.

use std::collections::HashMap;
use std::ops::Range;

use tracing::{debug, warn};

use super::{is_code_shaped, is_descriptive, is_structural, is_year_like, parse_sum, year_value};
use super::{ParsedSum, TokenStream};
use crate::codes::CodeList;
use crate::models::config::{DuplicatePolicy, ExtractionConfig};

/// A code token and the values collected for it, one per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGroup {
    /// Position of the code token.
    pub code_index: usize,
    /// Tokens consumed as values.
    pub values_span: Range<usize>,
    /// Exactly one value per column.
    pub values: Vec<i64>,
}

impl CodeGroup {
    pub fn code<'t>(&self, tokens: &'t TokenStream) -> &'t str {
        tokens.at(self.code_index)
    }
}

/// Outcome of a full scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Association {
    pub groups: Vec<CodeGroup>,
    /// The scan stopped at the code cap with input left.
    pub capped: bool,
}

/// Scans a token stream for codes and the values that follow them.
#[derive(Debug, Clone)]
pub struct Associator<'a> {
    tokens: &'a TokenStream,
    columns: usize,
    codes: Option<&'a CodeList>,
    lookback: usize,
    lookahead: usize,
    max_codes: usize,
    context_gate: bool,
}

impl<'a> Associator<'a> {
    /// The row-label gate is on whenever the stream carries non-ASCII letters.
    pub fn new(tokens: &'a TokenStream, columns: usize) -> Self {
        let defaults = ExtractionConfig::default();
        Self {
            tokens,
            columns: columns.max(1),
            codes: None,
            lookback: defaults.lookback_window,
            lookahead: defaults.lookahead_window,
            max_codes: defaults.max_codes,
            context_gate: tokens.has_native_text(),
        }
    }

    /// Take windows and the code cap from the extraction settings.
    pub fn with_config(self, config: &ExtractionConfig) -> Self {
        self.with_windows(config.lookback_window, config.lookahead_window)
            .with_max_codes(config.max_codes)
    }

    pub fn with_codes(mut self, codes: Option<&'a CodeList>) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_windows(mut self, lookback: usize, lookahead: usize) -> Self {
        self.lookback = lookback;
        self.lookahead = lookahead;
        self
    }

    pub fn with_max_codes(mut self, max_codes: usize) -> Self {
        self.max_codes = max_codes;
        self
    }

    pub fn context_gate(&self) -> bool {
        self.context_gate
    }

    fn is_allow_listed(&self, token: &str) -> bool {
        self.codes.is_some_and(|codes| codes.contains(token))
    }

    /// Whether the token at `index` starts a new code group.
    ///
    /// Allow-listed codes are always accepted. Otherwise years and numbers
    /// below 1000 are rejected, and under the context gate a row label
    /// must precede the token.
    pub fn is_candidate(&self, index: usize) -> bool {
        let token = self.tokens.at(index);
        if !is_code_shaped(token) {
            return false;
        }
        if self.is_allow_listed(token) {
            return true;
        }
        if is_year_like(token) || token.parse::<u32>().map_or(true, |n| n < 1000) {
            return false;
        }
        !self.context_gate || self.has_row_label(index)
    }

    /// Look back for a descriptive row label, stopping at the previous code.
    pub fn has_row_label(&self, index: usize) -> bool {
        let from = index.saturating_sub(self.lookback);
        for token in self.tokens.span(from..index).iter().rev() {
            if is_code_shaped(token) && !is_year_like(token) {
                return false;
            }
            if is_descriptive(token) && !is_structural(token) && year_value(token).is_none() {
                return true;
            }
        }
        false
    }

    /// Collect the values following the code at `index`.
    ///
    /// Returns the group and the position where scanning resumes.
    pub fn collect_values(&self, index: usize) -> (CodeGroup, usize) {
        let start = index + 1;
        let bound = start.saturating_add(self.lookahead).min(self.tokens.len());

        let mut entries: Vec<ParsedSum> = Vec::new();
        let mut numbers = 0;
        let mut consumed_end = start;
        let mut resume = bound;

        for j in start..bound {
            let token = self.tokens.at(j);
            if is_descriptive(token) || self.is_candidate(j) {
                resume = j;
                break;
            }
            let Some(parsed) = parse_sum(token) else {
                continue;
            };
            entries.push(parsed);
            consumed_end = j + 1;
            if !parsed.is_placeholder() {
                numbers += 1;
                if numbers >= self.columns {
                    resume = j + 1;
                    break;
                }
            }
        }

        // Surplus placeholders are the noisiest cells; drop them first.
        while entries.len() > self.columns {
            match entries.iter().position(|e| e.is_placeholder()) {
                Some(pos) => {
                    entries.remove(pos);
                }
                None => break,
            }
        }

        let mut values: Vec<i64> = entries.iter().take(self.columns).map(|e| e.value()).collect();
        values.resize(self.columns, 0);

        let group = CodeGroup {
            code_index: index,
            values_span: start..consumed_end,
            values,
        };
        (group, resume)
    }

    /// Code groups of the whole stream, left to right.
    pub fn associate(&self) -> Vec<CodeGroup> {
        self.scan().groups
    }

    /// Scan the whole stream, left to right.
    pub fn scan(&self) -> Association {
        let mut groups = Vec::new();
        let mut capped = false;
        let mut i = 0;

        while i < self.tokens.len() {
            if !self.is_candidate(i) {
                i += 1;
                continue;
            }
            if groups.len() >= self.max_codes {
                warn!("Code limit of {} reached at token {}", self.max_codes, i);
                capped = true;
                break;
            }

            let (group, resume) = self.collect_values(i);
            debug!(
                "Code {} at {} -> {:?} (tokens {:?})",
                group.code(self.tokens),
                i,
                group.values,
                group.values_span
            );
            groups.push(group);
            i = resume.max(i + 1);
        }

        Association { groups, capped }
    }
}

/// Resolve repeated codes according to the policy.
pub fn apply_duplicate_policy(
    groups: Vec<CodeGroup>,
    tokens: &TokenStream,
    policy: DuplicatePolicy,
) -> Vec<CodeGroup> {
    if policy == DuplicatePolicy::Independent {
        return groups;
    }

    let mut merged: Vec<CodeGroup> = Vec::with_capacity(groups.len());
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for group in groups {
        let code = tokens.at(group.code_index);
        let Some(&slot) = seen.get(code) else {
            seen.insert(code, merged.len());
            merged.push(group);
            continue;
        };

        debug!("Duplicate code {} at {} ({:?})", code, group.code_index, policy);
        let existing = &mut merged[slot];
        match policy {
            DuplicatePolicy::Independent | DuplicatePolicy::FirstWins => {}
            DuplicatePolicy::LastWins => {
                existing.values = group.values;
                existing.values_span = group.values_span;
            }
            DuplicatePolicy::Sum => {
                for (total, value) in existing.values.iter_mut().zip(group.values) {
                    *total = total.saturating_add(value);
                }
            }
        }
    }

    merged
}
