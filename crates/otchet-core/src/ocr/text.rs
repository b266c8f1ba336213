//! Plain-text layouts: quoted fragment dumps and line-per-fragment files.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref QUOTED_FRAGMENT: Regex = Regex::new(r"'([^'\n]*)'").unwrap();
}

/// An array dump: opens with `[` and is mostly quoted fragments.
///
/// Apostrophes inside ordinary lines (`ООО 'Ромашка'`) do not qualify.
pub(super) fn is_quoted_dump(content: &str) -> bool {
    let trimmed = content.trim();
    if !trimmed.starts_with('[') {
        return false;
    }
    let quoted: usize = QUOTED_FRAGMENT.find_iter(trimmed).map(|m| m.as_str().len()).sum();
    let payload = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '[' | ']' | ','))
        .map(char::len_utf8)
        .sum::<usize>();
    quoted > 0 && quoted * 2 >= payload
}

/// Every single-quoted string becomes a fragment of one page.
pub(super) fn pages_from_quoted(content: &str) -> Vec<Vec<String>> {
    let page: Vec<String> = QUOTED_FRAGMENT
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect();
    vec![page]
}

/// One fragment per line; a form feed starts a new page.
pub(super) fn pages_from_lines(content: &str) -> Vec<Vec<String>> {
    content
        .split('\x0c')
        .map(|page| page.lines().map(str::to_string).collect::<Vec<_>>())
        .filter(|page| page.iter().any(|line| !line.trim().is_empty()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quoted_dump() {
        let pages = pages_from_quoted("[ 'Запасы', '1210', '12 500', '' ]");
        assert_eq!(pages, vec![vec!["Запасы", "1210", "12 500", ""]]);
    }

    #[test]
    fn test_quoted_dump_detection() {
        assert!(is_quoted_dump("['1110', '1120']"));
        assert!(is_quoted_dump("  [ 'Запасы', '1210', '12 500', '' ]\n"));
        assert!(!is_quoted_dump("Организация ООО 'Ромашка'\nЗапасы\n1210\n"));
        assert!(!is_quoted_dump("[1] 'сноска' и длинный текст без кавычек вокруг остальных слов"));
    }

    #[test]
    fn test_lines_with_form_feed() {
        let pages = pages_from_lines("АКТИВ\n1110\n\x0cПАССИВ\n1300\n\x0c\n");
        assert_eq!(pages, vec![vec!["АКТИВ", "1110"], vec!["ПАССИВ", "1300"]]);
    }
}
