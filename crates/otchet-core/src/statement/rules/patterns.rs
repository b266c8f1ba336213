//! Common regex patterns for statement token classification.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Accounting code: the whole token is 4-5 digits
    pub static ref CODE_TOKEN: Regex = Regex::new(r"^\d{4,5}$").unwrap();

    // Year token, tolerating trailing OCR debris ("2023 г.", "2024*")
    pub static ref YEAR_TOKEN: Regex = Regex::new(r"^(\d{4})(\D*)$").unwrap();

    // Bare day number split from its month word
    pub static ref DAY_TOKEN: Regex = Regex::new(r"^(\d{1,2})\.?$").unwrap();

    // "На 30 сентября 2024 г." / "31 декабря 2023"
    pub static ref DAY_MONTH_YEAR: Regex = Regex::new(
        r"(?:^|[^\d])(\d{1,2})\s*(\p{L}{3,})\.?,?\s*(\d{4})(?:\D|$)"
    ).unwrap();

    // "31.12.2023" or "31/12/2023"
    pub static ref NUMERIC_DATE: Regex = Regex::new(
        r"(?:^|[^\d])(\d{1,2})[./](\d{1,2})[./](\d{4})(?:\D|$)"
    ).unwrap();

    // "На 31 декабря" (year follows in a later token)
    pub static ref DAY_MONTH: Regex = Regex::new(
        r"(?:^|[^\d])(\d{1,2})\s+(\p{L}{3,})"
    ).unwrap();

    // Month word at the start of a token, year optional ("декабря", "декабря 2023 г.")
    pub static ref MONTH_LEAD: Regex = Regex::new(
        r"^(\p{L}{3,})\.?,?(?:\s+(\d{4}))?"
    ).unwrap();

    // "За Январь - Сентябрь 2024 г." (no day; period ends with the month)
    pub static ref MONTH_YEAR: Regex = Regex::new(
        r"(\p{L}{3,})\.?,?\s+(\d{4})(?:\D|$)"
    ).unwrap();

    // "Дата (число, месяц, год)" label of the report date cells
    pub static ref DATE_LABEL: Regex = Regex::new(r"(?i)^дата\s*\(\s*число").unwrap();

    // Column header fragment used to guess the column count
    pub static ref DATE_HEADER: Regex = Regex::new(
        r"^На\s+\S|(?:^|\s)\d{1,2}\s+\p{L}{3,}"
    ).unwrap();

    // Thousands groups separated by dots or commas ("37.992", "1,234,567")
    pub static ref GROUPED_NUMBER: Regex = Regex::new(r"^\d{1,3}(?:[.,]\d{3})+$").unwrap();
}
