//! Reference list of valid accounting codes (allow-list).

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::statement::rules::is_code_shaped;

/// Set of valid 4-5 digit accounting codes.
///
/// Loaded once by the caller and handed to the parser; reads need no
/// synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeList {
    codes: BTreeSet<String>,
}

impl CodeList {
    /// Parse a newline-delimited list. Lines that are not 4-5 digit codes are ignored.
    pub fn parse(text: &str) -> Self {
        let codes: BTreeSet<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| is_code_shaped(line))
            .map(str::to_string)
            .collect();

        debug!("Loaded {} reference codes", codes.len());
        Self { codes }
    }

    /// Load a newline-delimited list from a file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CodeList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            codes: iter
                .into_iter()
                .map(Into::into)
                .filter(|code: &String| is_code_shaped(code))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_noise() {
        let list = CodeList::parse("1110\r\n  1150 \n\nкод\n123\n115012\n11501\n");

        assert_eq!(list.len(), 3);
        assert!(list.contains("1110"));
        assert!(list.contains("1150"));
        assert!(list.contains("11501"));
        assert!(!list.contains("123"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"2110\n2120\n2400\n").unwrap();

        let list = CodeList::from_file(file.path()).unwrap();
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["2110", "2120", "2400"]);
    }

    #[test]
    fn test_from_iter() {
        let list: CodeList = ["2510", "2520", "x"].into_iter().collect();
        assert_eq!(list.len(), 2);
    }
}
