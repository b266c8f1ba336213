//! Reporting date inference for statement value columns.

use chrono::{Datelike, Months, NaiveDate};
use tracing::debug;

use super::patterns::{
    DATE_LABEL, DAY_MONTH, DAY_MONTH_YEAR, DAY_TOKEN, MONTH_LEAD, MONTH_YEAR, NUMERIC_DATE,
    YEAR_TOKEN,
};
use super::{first_match, year_value, ExtractionMatch, Strategy, TokenStream};
use crate::models::statement::{DateSource, ReportingDate, ResolvedDate, StatementForm};

/// Inputs the date resolver needs besides the tokens.
#[derive(Debug, Clone)]
pub struct DateContext {
    pub form: StatementForm,
    pub columns: usize,
    /// Anchor for defaults when the document names no date.
    pub period_end: NaiveDate,
    /// Tokens searched after a day/month phrase for its year.
    pub year_search_window: usize,
}

/// Month roots, matched as prefixes of the lowercased word.
const MONTH_ROOTS: [(&str, u32); 27] = [
    ("январ", 1),
    ("янв", 1),
    ("феврал", 2),
    ("фев", 2),
    ("мар", 3),
    ("апр", 4),
    ("май", 5),
    ("мая", 5),
    ("июн", 6),
    ("июл", 7),
    ("авг", 8),
    ("сен", 9),
    ("окт", 10),
    ("ноя", 11),
    ("дек", 12),
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// Month number for a (possibly declined or abbreviated) month word.
pub fn month_number(word: &str) -> Option<u32> {
    let cleaned: String = word
        .chars()
        .filter(|c| !matches!(c, '.' | ','))
        .collect::<String>()
        .trim()
        .to_lowercase();

    if cleaned.chars().count() < 3 {
        return None;
    }

    MONTH_ROOTS
        .iter()
        .find(|(root, _)| cleaned.starts_with(root))
        .map(|(_, month)| *month)
}

/// A date phrase found at one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FoundDate {
    date: ReportingDate,
    /// False when the year had to be borrowed from the anchor date.
    year_from_document: bool,
}

type PhraseMatcher = fn(&TokenStream, usize, &DateContext) -> Option<FoundDate>;

/// Per-token date matchers in priority order.
const PHRASE_MATCHERS: [(&str, PhraseMatcher); 6] = [
    ("dated_label", dated_label),
    ("day_month_year", day_month_year),
    ("numeric_date", numeric_date),
    ("day_month", day_month),
    ("split_day_month", split_day_month),
    ("month_year", month_year),
];

/// "Дата (число, месяц, год)" followed by day, month and year cells.
fn dated_label(tokens: &TokenStream, i: usize, _ctx: &DateContext) -> Option<FoundDate> {
    if !DATE_LABEL.is_match(tokens.at(i)) {
        return None;
    }
    let day: u32 = DAY_TOKEN.captures(tokens.get(i + 1)?)?[1].parse().ok()?;
    let month_cell = tokens.get(i + 2)?;
    let month = match month_cell.trim_end_matches('.').parse::<u32>() {
        Ok(n) => (1..=12).contains(&n).then_some(n)?,
        Err(_) => month_number(month_cell)?,
    };
    let year = year_value(tokens.get(i + 3)?)?;
    Some(FoundDate {
        date: ReportingDate::from_parts(year, month, day),
        year_from_document: true,
    })
}

fn day_month_year(tokens: &TokenStream, i: usize, _ctx: &DateContext) -> Option<FoundDate> {
    let caps = DAY_MONTH_YEAR.captures(tokens.at(i))?;
    let month = month_number(&caps[2])?;
    let day: u32 = caps[1].parse().ok()?;
    let year = year_value(&caps[3])?;
    Some(FoundDate {
        date: ReportingDate::from_parts(year, month, day),
        year_from_document: true,
    })
}

fn numeric_date(tokens: &TokenStream, i: usize, _ctx: &DateContext) -> Option<FoundDate> {
    let caps = NUMERIC_DATE.captures(tokens.at(i))?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year = year_value(&caps[3])?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(FoundDate {
        date: ReportingDate::from_parts(year, month, day),
        year_from_document: true,
    })
}

fn day_month(tokens: &TokenStream, i: usize, ctx: &DateContext) -> Option<FoundDate> {
    let caps = DAY_MONTH.captures(tokens.at(i))?;
    let month = month_number(&caps[2])?;
    let day: u32 = caps[1].parse().ok()?;
    Some(with_year_after(tokens, i + 1, day, month, ctx))
}

fn split_day_month(tokens: &TokenStream, i: usize, ctx: &DateContext) -> Option<FoundDate> {
    let day: u32 = DAY_TOKEN.captures(tokens.at(i))?[1].parse().ok()?;
    let next = tokens.get(i + 1)?;
    let caps = MONTH_LEAD.captures(next)?;
    let month = month_number(&caps[1])?;

    if let Some(year) = caps.get(2).and_then(|m| year_value(m.as_str())) {
        return Some(FoundDate {
            date: ReportingDate::from_parts(year, month, day),
            year_from_document: true,
        });
    }
    Some(with_year_after(tokens, i + 2, day, month, ctx))
}

fn month_year(tokens: &TokenStream, i: usize, _ctx: &DateContext) -> Option<FoundDate> {
    let caps = MONTH_YEAR
        .captures_iter(tokens.at(i))
        .filter(|caps| month_number(&caps[1]).is_some())
        .last()?;
    let month = month_number(&caps[1])?;
    let year = year_value(&caps[2])?;

    // A period named by its last month ends on that month's last day.
    let last_day = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())?;
    Some(FoundDate {
        date: ReportingDate::Date(last_day),
        year_from_document: true,
    })
}

fn with_year_after(tokens: &TokenStream, from: usize, day: u32, month: u32, ctx: &DateContext) -> FoundDate {
    match find_year(tokens, from, ctx.year_search_window) {
        Some(year) => FoundDate {
            date: ReportingDate::from_parts(year, month, day),
            year_from_document: true,
        },
        None => FoundDate {
            date: ReportingDate::from_parts(ctx.period_end.year(), month, day),
            year_from_document: false,
        },
    }
}

fn find_year(tokens: &TokenStream, from: usize, window: usize) -> Option<i32> {
    (from..from.saturating_add(window).min(tokens.len())).find_map(|j| year_value(tokens.at(j)))
}

/// Primary strategy: explicit date phrases in the column headers.
pub struct DatePhrases<'a> {
    pub ctx: &'a DateContext,
}

impl Strategy for DatePhrases<'_> {
    type Output = Vec<ResolvedDate>;

    fn name(&self) -> &'static str {
        "date_phrases"
    }

    fn apply(&self, tokens: &TokenStream) -> Option<ExtractionMatch<Vec<ResolvedDate>>> {
        let mut dates: Vec<ResolvedDate> = Vec::new();
        let mut first_position = None;

        for i in 0..tokens.len() {
            if dates.len() >= self.ctx.columns {
                break;
            }
            let found = PHRASE_MATCHERS.iter().find_map(|(name, matcher)| {
                matcher(tokens, i, self.ctx).map(|found| (*name, found))
            });
            let Some((matcher, found)) = found else {
                continue;
            };

            debug!("Date {} from {:?} via {}", found.date, tokens.at(i), matcher);
            if dates.iter().any(|d| d.date == found.date) {
                continue;
            }
            let source = if found.year_from_document {
                DateSource::Resolved
            } else {
                DateSource::Defaulted
            };
            dates.push(ResolvedDate::new(found.date, source));
            first_position.get_or_insert(i);
        }

        let position = first_position?;
        Some(ExtractionMatch::new(dates, self.name(), tokens.at(position)).with_position(position))
    }
}

/// Words that mark a nearby bare year as a reporting period.
const TEMPORAL_WORDS: [&str; 17] = [
    "на", "за", "по", "период", "периода", "год", "года", "году", "г", "for", "as", "of",
    "period", "year", "ended", "ending", "date",
];

/// Tokens around a year token searched for temporal words.
const TEMPORAL_WINDOW: usize = 3;

fn is_temporal(token: &str) -> bool {
    token
        .to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
        .any(|word| TEMPORAL_WORDS.contains(&word) || month_number(word).is_some())
}

/// Secondary strategy: bare years next to temporal words.
///
/// Only the year is read from the document. Balance prior columns close
/// on December 31 by form convention; every other column borrows the
/// configured period end's month and day and is marked as a default.
pub struct YearTokens<'a> {
    pub ctx: &'a DateContext,
}

impl Strategy for YearTokens<'_> {
    type Output = Vec<ResolvedDate>;

    fn name(&self) -> &'static str {
        "year_tokens"
    }

    fn apply(&self, tokens: &TokenStream) -> Option<ExtractionMatch<Vec<ResolvedDate>>> {
        let mut years: Vec<i32> = Vec::new();
        let mut first_position = None;

        for (i, token) in tokens.iter().enumerate() {
            if years.len() >= self.ctx.columns {
                break;
            }
            if !YEAR_TOKEN.is_match(token) {
                continue;
            }
            let Some(year) = year_value(token) else {
                continue;
            };

            let from = i.saturating_sub(TEMPORAL_WINDOW);
            let to = (i + TEMPORAL_WINDOW + 1).min(tokens.len());
            if !tokens.span(from..to).iter().any(|t| is_temporal(t)) {
                continue;
            }

            if !years.contains(&year) {
                years.push(year);
                first_position.get_or_insert(i);
            }
        }

        let position = first_position?;
        let period_end = self.ctx.period_end;
        let dates = years
            .iter()
            .enumerate()
            .map(|(col, &year)| {
                if col == 0 || self.ctx.form == StatementForm::IncomeStatement {
                    let date = ReportingDate::from_parts(year, period_end.month(), period_end.day());
                    ResolvedDate::new(date, DateSource::Defaulted)
                } else {
                    ResolvedDate::new(ReportingDate::from_parts(year, 12, 31), DateSource::Resolved)
                }
            })
            .collect();

        Some(ExtractionMatch::new(dates, self.name(), tokens.at(position)).with_position(position))
    }
}

/// Default column dates for a form, anchored on the first column's date.
///
/// Balance: period end, then the two previous year ends.
/// Income statement: period, then the same period a year earlier.
pub fn form_defaults(form: StatementForm, anchor: ReportingDate) -> Vec<ReportingDate> {
    let year = anchor.year();
    match form {
        StatementForm::IncomeStatement => {
            let previous = match anchor {
                ReportingDate::Date(date) => date
                    .checked_sub_months(Months::new(12))
                    .map(ReportingDate::Date)
                    .unwrap_or(ReportingDate::Year(year - 1)),
                ReportingDate::Year(y) => ReportingDate::Year(y - 1),
            };
            vec![anchor, previous]
        }
        StatementForm::Balance | StatementForm::Unknown => vec![
            anchor,
            ReportingDate::from_parts(year - 1, 12, 31),
            ReportingDate::from_parts(year - 2, 12, 31),
        ],
    }
}

/// Step a date back one quarter.
fn step_back(date: ReportingDate) -> ReportingDate {
    date.as_date()
        .and_then(|d| d.checked_sub_months(Months::new(3)))
        .map(ReportingDate::Date)
        .unwrap_or(ReportingDate::Year(date.year() - 1))
}

/// Resolve exactly `ctx.columns` dates for the value columns.
///
/// Never fails: document dates first, then form defaults, then dates
/// synthesized by stepping back a quarter at a time.
pub fn resolve_dates(tokens: &TokenStream, ctx: &DateContext) -> Vec<ResolvedDate> {
    let phrases = DatePhrases { ctx };
    let years = YearTokens { ctx };
    let strategies: [&dyn Strategy<Output = Vec<ResolvedDate>>; 2] = [&phrases, &years];

    let mut dates = match first_match(&strategies, tokens) {
        Some(m) => {
            debug!("Column dates via {} starting at {:?}", m.strategy, m.source);
            m.value
        }
        None => Vec::new(),
    };
    dates.truncate(ctx.columns);

    if dates.len() < ctx.columns {
        let anchor = dates
            .first()
            .map(|d| d.date)
            .unwrap_or(ReportingDate::Date(ctx.period_end));

        for default in form_defaults(ctx.form, anchor) {
            if dates.len() >= ctx.columns {
                break;
            }
            let older = match dates.last() {
                Some(last) => default.as_date() < last.date.as_date(),
                None => true,
            };
            if older && !dates.iter().any(|d| d.date == default) {
                dates.push(ResolvedDate::new(default, DateSource::Defaulted));
            }
        }
    }

    while dates.len() < ctx.columns {
        let previous = dates
            .last()
            .map(|d| d.date)
            .unwrap_or(ReportingDate::Date(ctx.period_end));
        dates.push(ResolvedDate::new(step_back(previous), DateSource::Synthesized));
    }

    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stream(tokens: &[&str]) -> TokenStream {
        TokenStream::from_pages(&[tokens], 1000)
    }

    fn ctx(form: StatementForm, columns: usize) -> DateContext {
        DateContext {
            form,
            columns,
            period_end: NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
            year_search_window: 5,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> ReportingDate {
        ReportingDate::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn plain(dates: &[ResolvedDate]) -> Vec<String> {
        dates.iter().map(|d| d.date.to_string()).collect()
    }

    #[test]
    fn test_month_number() {
        assert_eq!(month_number("января"), Some(1));
        assert_eq!(month_number("Февраля"), Some(2));
        assert_eq!(month_number("марта"), Some(3));
        assert_eq!(month_number("мая"), Some(5));
        assert_eq!(month_number("май"), Some(5));
        assert_eq!(month_number("июня"), Some(6));
        assert_eq!(month_number("июля"), Some(7));
        assert_eq!(month_number("сентября"), Some(9));
        assert_eq!(month_number("Сентябрь"), Some(9));
        assert_eq!(month_number("дек."), Some(12));
        assert_eq!(month_number("December"), Some(12));
        assert_eq!(month_number("месяцев"), None);
        assert_eq!(month_number("ма"), None);
    }

    #[test]
    fn test_balance_headers() {
        let tokens = stream(&[
            "Наименование показателя",
            "Код",
            "На 30 сентября",
            "2024 г.",
            "На 31 декабря",
            "2023 г.",
            "На 31 декабря",
            "2022 г.",
        ]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::Balance, 3));

        assert_eq!(plain(&dates), vec!["2024-09-30", "2023-12-31", "2022-12-31"]);
        assert!(dates.iter().all(|d| d.source == DateSource::Resolved));
    }

    #[test]
    fn test_full_phrase_in_one_token() {
        let tokens = stream(&["На 31 декабря 2023 г.", "На 31 декабря 2022 г."]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::IncomeStatement, 2));
        assert_eq!(plain(&dates), vec!["2023-12-31", "2022-12-31"]);
    }

    #[test]
    fn test_split_day_and_month() {
        let tokens = stream(&["На", "30", "сентября", "2024", "г."]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::Balance, 3));

        assert_eq!(dates[0], ResolvedDate::new(date(2024, 9, 30), DateSource::Resolved));
        assert_eq!(dates[1], ResolvedDate::new(date(2023, 12, 31), DateSource::Defaulted));
        assert_eq!(dates[2], ResolvedDate::new(date(2022, 12, 31), DateSource::Defaulted));
    }

    #[test]
    fn test_numeric_date() {
        let tokens = stream(&["Дата 31.03.2024", "31/12/2023"]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::IncomeStatement, 2));
        assert_eq!(plain(&dates), vec!["2024-03-31", "2023-12-31"]);
    }

    #[test]
    fn test_period_by_month_range() {
        let tokens = stream(&["За Январь - Сентябрь 2024 г.", "За Январь - Сентябрь 2023 г."]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::IncomeStatement, 2));
        assert_eq!(plain(&dates), vec!["2024-09-30", "2023-09-30"]);
    }

    #[test]
    fn test_missing_year_borrows_anchor() {
        let tokens = stream(&["На 31 марта"]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::IncomeStatement, 2));

        assert_eq!(dates[0], ResolvedDate::new(date(2024, 3, 31), DateSource::Defaulted));
        assert_eq!(dates[1], ResolvedDate::new(date(2023, 3, 31), DateSource::Defaulted));
    }

    #[test]
    fn test_duplicate_dates_collapse() {
        let tokens = stream(&["31 декабря 2023", "31 декабря 2023", "31 декабря 2022"]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::Balance, 3));
        assert_eq!(plain(&dates), vec!["2023-12-31", "2022-12-31", "2021-12-31"]);
        assert_eq!(dates[2].source, DateSource::Defaulted);
    }

    #[test]
    fn test_year_tokens_with_keywords() {
        let tokens = stream(&["Отчетный период", "2024", "Предыдущий год", "2023", "2022 г."]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::Balance, 3));
        assert_eq!(plain(&dates), vec!["2024-09-30", "2023-12-31", "2022-12-31"]);

        // Month and day of the first column come from configuration.
        let sources: Vec<DateSource> = dates.iter().map(|d| d.source).collect();
        assert_eq!(
            sources,
            vec![DateSource::Defaulted, DateSource::Resolved, DateSource::Resolved]
        );
    }

    #[test]
    fn test_year_tokens_income_borrow_period_end() {
        let tokens = stream(&["За период", "2024", "За период", "2023"]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::IncomeStatement, 2));
        assert_eq!(plain(&dates), vec!["2024-09-30", "2023-09-30"]);
        assert!(dates.iter().all(|d| d.source == DateSource::Defaulted));
    }

    #[test]
    fn test_dated_label_cells() {
        let tokens = stream(&[
            "Бухгалтерский баланс",
            "Дата (число, месяц, год)",
            "31",
            "03",
            "2024",
            "Запасы",
            "1210",
        ]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::Balance, 3));

        assert_eq!(dates[0], ResolvedDate::new(date(2024, 3, 31), DateSource::Resolved));
        assert_eq!(dates[1], ResolvedDate::new(date(2023, 12, 31), DateSource::Defaulted));
        assert_eq!(dates[2], ResolvedDate::new(date(2022, 12, 31), DateSource::Defaulted));
    }

    #[test]
    fn test_dated_label_needs_valid_cells() {
        let tokens = stream(&["Дата (число, месяц, год)", "31", "13", "2024"]);
        let phrases = DatePhrases { ctx: &ctx(StatementForm::Balance, 3) };
        assert!(phrases.apply(&tokens).is_none());

        let tokens = stream(&["Дата (число, месяц, год)", "30", "сентября", "2024"]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::Balance, 3));
        assert_eq!(dates[0], ResolvedDate::new(date(2024, 9, 30), DateSource::Resolved));
    }

    #[test]
    fn test_bare_numbers_are_not_years() {
        // Income statement codes in the year range carry no temporal context.
        let tokens = stream(&["Выручка", "2110", "1 500", "2023"]);
        let years = YearTokens { ctx: &ctx(StatementForm::IncomeStatement, 2) };
        assert!(years.apply(&tokens).is_none());
    }

    #[test]
    fn test_defaults_without_dates() {
        let tokens = stream(&["test", "1110", "1310"]);

        let dates = resolve_dates(&tokens, &ctx(StatementForm::Unknown, 3));
        assert_eq!(plain(&dates), vec!["2024-09-30", "2023-12-31", "2022-12-31"]);
        assert!(dates.iter().all(|d| d.source == DateSource::Defaulted));

        let dates = resolve_dates(&tokens, &ctx(StatementForm::IncomeStatement, 2));
        assert_eq!(plain(&dates), vec!["2024-09-30", "2023-09-30"]);
    }

    #[test]
    fn test_synthesized_when_defaults_exhausted() {
        // The only found date is older than every default but the anchor.
        let tokens = stream(&["31 декабря 2020", "31 декабря 2019"]);
        let dates = resolve_dates(&tokens, &ctx(StatementForm::IncomeStatement, 3));
        assert_eq!(plain(&dates), vec!["2020-12-31", "2019-12-31", "2019-09-30"]);
        assert_eq!(dates[2].source, DateSource::Synthesized);
    }
}
