//! Token normalization: flatten OCR pages into one cleaned token sequence.

use std::ops::Range;

use tracing::warn;

use super::has_native_text;

/// Ordered, immutable sequence of cleaned tokens.
///
/// Later stages refer to tokens by index and to runs of tokens by index
/// ranges; token text is never copied while scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<String>,
    truncated: bool,
}

impl TokenStream {
    /// Flatten pages in order, clean every fragment and drop empty ones.
    ///
    /// At most `max_tokens` tokens are kept.
    pub fn from_pages<P, S>(pages: &[P], max_tokens: usize) -> Self
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut tokens = Vec::new();
        let mut truncated = false;

        'pages: for page in pages {
            for fragment in page.as_ref() {
                let token = clean_token(fragment.as_ref());
                if token.is_empty() {
                    continue;
                }
                if tokens.len() >= max_tokens {
                    truncated = true;
                    break 'pages;
                }
                tokens.push(token);
            }
        }

        if truncated {
            warn!("Token stream truncated to {} tokens", max_tokens);
        }

        Self { tokens, truncated }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether the `max_tokens` bound cut the input short.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Token at `index`; callers keep indices in bounds.
    pub fn at(&self, index: usize) -> &str {
        &self.tokens[index]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    /// Tokens covered by `range`, clamped to the stream.
    pub fn span(&self, range: Range<usize>) -> &[String] {
        let end = range.end.min(self.tokens.len());
        let start = range.start.min(end);
        &self.tokens[start..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Whether any token carries non-ASCII letters.
    pub fn has_native_text(&self) -> bool {
        self.tokens.iter().any(|t| has_native_text(t))
    }

    /// Copy of the first `n` tokens, for diagnostics.
    pub fn head(&self, n: usize) -> Vec<String> {
        self.tokens.iter().take(n).cloned().collect()
    }
}

/// Clean one raw OCR fragment.
///
/// Removes NUL and byte-order marks, drops `|` cell separators, collapses
/// whitespace runs (non-breaking spaces included) to one space and trims.
pub fn clean_token(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '\0' | '\u{feff}' | '|'))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
