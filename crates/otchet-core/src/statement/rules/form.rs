//! Statement form detection and column count inference.

use tracing::debug;

use super::patterns::DATE_HEADER;
use super::{first_match, ExtractionMatch, Strategy, TokenStream};
use crate::models::statement::StatementForm;

/// Most value columns any supported form prints.
pub const MAX_COLUMNS: usize = 3;

/// The classifier's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDecision {
    pub form: StatementForm,
    /// Number of value columns per code; never zero.
    pub columns: usize,
    /// Strategy that decided.
    pub strategy: &'static str,
}

/// Token right after the "Форма по ОКУД" label.
pub struct OkudLabel;

/// `0710001` / `0710002` anywhere in the stream.
pub struct OkudLiteral;

/// Title keywords ("БАЛАНС", "ОТЧЕТ О ФИНАНСОВЫХ РЕЗУЛЬТАТАХ").
pub struct TitleKeywords;

/// Count of date-header fragments, for unrecognized forms.
pub struct DateHeaderCount;

impl Strategy for OkudLabel {
    type Output = StatementForm;

    fn name(&self) -> &'static str {
        "okud_label"
    }

    fn apply(&self, tokens: &TokenStream) -> Option<ExtractionMatch<StatementForm>> {
        for (i, token) in tokens.iter().enumerate() {
            let lower = token.to_lowercase();
            let Some(label_end) = lower.find("окуд") else {
                continue;
            };

            // Code printed in the label cell itself ("Форма по ОКУД 0710001")
            if let Some(form) = StatementForm::from_okud(&lower[label_end..]) {
                return Some(ExtractionMatch::new(form, self.name(), token).with_position(i));
            }

            if let Some(next) = tokens.get(i + 1) {
                if let Some(form) = StatementForm::from_okud(next) {
                    return Some(ExtractionMatch::new(form, self.name(), next).with_position(i + 1));
                }
            }
        }
        None
    }
}

impl Strategy for OkudLiteral {
    type Output = StatementForm;

    fn name(&self) -> &'static str {
        "okud_literal"
    }

    fn apply(&self, tokens: &TokenStream) -> Option<ExtractionMatch<StatementForm>> {
        for (literal, form) in [
            ("0710001", StatementForm::Balance),
            ("0710002", StatementForm::IncomeStatement),
        ] {
            if let Some(i) = tokens.iter().position(|t| t.contains(literal)) {
                return Some(ExtractionMatch::new(form, self.name(), tokens.at(i)).with_position(i));
            }
        }
        None
    }
}

const BALANCE_KEYWORDS: [&str; 2] = ["баланс", "balance sheet"];
const INCOME_KEYWORDS: [&str; 5] = [
    "отчет",
    "отчёт",
    "income statement",
    "profit and loss",
    "financial results",
];

impl Strategy for TitleKeywords {
    type Output = StatementForm;

    fn name(&self) -> &'static str {
        "title_keywords"
    }

    fn apply(&self, tokens: &TokenStream) -> Option<ExtractionMatch<StatementForm>> {
        for (keywords, form) in [
            (&BALANCE_KEYWORDS[..], StatementForm::Balance),
            (&INCOME_KEYWORDS[..], StatementForm::IncomeStatement),
        ] {
            let found = tokens.iter().position(|t| {
                let lower = t.to_lowercase();
                keywords.iter().any(|k| lower.contains(k))
            });
            if let Some(i) = found {
                return Some(ExtractionMatch::new(form, self.name(), tokens.at(i)).with_position(i));
            }
        }
        None
    }
}

impl Strategy for DateHeaderCount {
    type Output = StatementForm;

    fn name(&self) -> &'static str {
        "date_header_count"
    }

    /// Always matches; the header count travels in `source`.
    fn apply(&self, tokens: &TokenStream) -> Option<ExtractionMatch<StatementForm>> {
        let headers = tokens.iter().filter(|t| DATE_HEADER.is_match(t)).count();
        Some(ExtractionMatch::new(
            StatementForm::Unknown,
            self.name(),
            headers.to_string(),
        ))
    }
}

/// Decide the statement form and how many value columns it has.
pub fn classify_form(tokens: &TokenStream) -> FormDecision {
    let strategies: [&dyn Strategy<Output = StatementForm>; 4] =
        [&OkudLabel, &OkudLiteral, &TitleKeywords, &DateHeaderCount];

    let decision = match first_match(&strategies, tokens) {
        Some(m) => {
            let columns = m.value.column_count().unwrap_or_else(|| {
                let headers: usize = m.source.parse().unwrap_or(0);
                match headers.min(MAX_COLUMNS) {
                    0 => MAX_COLUMNS,
                    n => n,
                }
            });
            FormDecision {
                form: m.value,
                columns,
                strategy: m.strategy,
            }
        }
        None => FormDecision {
            form: StatementForm::Unknown,
            columns: MAX_COLUMNS,
            strategy: "fallback",
        },
    };

    debug!(
        "Form {} with {} columns (strategy: {})",
        decision.form, decision.columns, decision.strategy
    );
    decision
}
