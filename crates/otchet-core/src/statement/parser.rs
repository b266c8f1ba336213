//! Rule-based statement parser: normalize, classify, date, associate.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::codes::CodeList;
use crate::error::ExtractionError;
use crate::models::config::{DuplicatePolicy, ExtractionConfig};
use crate::models::statement::{
    DateSource, ExtractionResult, LineItem, Statement, StatementForm,
};

use super::rules::{
    apply_duplicate_policy, classify_form, resolve_dates, Associator, CodeGroup, DateContext,
    TokenStream,
};
use super::{Result, StatementExtractor};

/// Statement parser over OCR token pages.
///
/// Holds no per-call state; one instance can serve any number of
/// concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct StatementParser {
    config: ExtractionConfig,
    /// Optional allow-list of valid codes.
    codes: Option<Arc<CodeList>>,
}

impl StatementParser {
    /// Create a parser with default settings and no allow-list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the extraction settings.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the allow-list of valid codes.
    pub fn with_codes(mut self, codes: impl Into<Arc<CodeList>>) -> Self {
        self.codes = Some(codes.into());
        self
    }

    /// Set the handling of repeated codes.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_policy = policy;
        self
    }

    /// Set the period end that anchors default dates.
    pub fn with_period_end(mut self, period_end: NaiveDate) -> Self {
        self.config.period_end = period_end;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn codes(&self) -> Option<&CodeList> {
        self.codes.as_deref()
    }

    /// Extract from any page/fragment shape.
    pub fn extract_pages<P, S>(&self, pages: &[P]) -> Result<Statement>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        let tokens = TokenStream::from_pages(pages, self.config.max_tokens);
        self.extract_tokens(&tokens)
    }

    /// Extract and fold the outcome into the wire-level result record.
    pub fn extract_result<P, S>(&self, pages: &[P]) -> ExtractionResult
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        self.extract_pages(pages).into()
    }

    /// Run the pipeline over a normalized token stream.
    pub fn extract_tokens(&self, tokens: &TokenStream) -> Result<Statement> {
        if tokens.is_empty() {
            return Err(ExtractionError::EmptyInput);
        }
        info!("Extracting statement from {} tokens", tokens.len());

        let mut warnings = Vec::new();
        if tokens.was_truncated() {
            warnings.push(format!("Input truncated to {} tokens", self.config.max_tokens));
        }

        // Form and column count
        let decision = classify_form(tokens);
        if decision.form == StatementForm::Unknown {
            warnings.push(format!(
                "Could not identify the statement form; assuming {} columns",
                decision.columns
            ));
        }

        // Column dates
        let context = DateContext {
            form: decision.form,
            columns: decision.columns,
            period_end: self.config.period_end,
            year_search_window: self.config.year_search_window,
        };
        let columns = resolve_dates(tokens, &context);
        for (index, column) in columns.iter().enumerate() {
            match column.source {
                DateSource::Resolved => {}
                DateSource::Defaulted => {
                    warnings.push(format!("Column {} date {} is a default", index + 1, column.date))
                }
                DateSource::Synthesized => warnings
                    .push(format!("Column {} date {} is synthesized", index + 1, column.date)),
            }
        }

        // Codes and values
        let scan = Associator::new(tokens, decision.columns)
            .with_config(&self.config)
            .with_codes(self.codes())
            .scan();
        if scan.capped {
            warnings.push(format!("Stopped after {} codes", self.config.max_codes));
        }
        let groups = scan.groups;

        let groups = self.filter_allowed(groups, tokens, &mut warnings);
        let groups = apply_duplicate_policy(groups, tokens, self.config.duplicate_policy);

        let items: Vec<LineItem> = groups
            .iter()
            .flat_map(|group| {
                let code = group.code(tokens);
                columns.iter().zip(&group.values).map(move |(column, &sum)| LineItem {
                    date: column.date,
                    code: code.to_string(),
                    sum,
                })
            })
            .collect();

        if items.is_empty() {
            warn!("No code/value associations in {} tokens", tokens.len());
            return Err(ExtractionError::NoStructuredData {
                diagnostics: tokens.head(self.config.diagnostics_limit),
            });
        }

        info!(
            "Extracted {} items for {} codes ({}, {} columns)",
            items.len(),
            groups.len(),
            decision.form,
            columns.len()
        );

        Ok(Statement {
            form: decision.form,
            form_strategy: decision.strategy.to_string(),
            columns,
            items,
            warnings,
        })
    }

    fn filter_allowed(
        &self,
        groups: Vec<CodeGroup>,
        tokens: &TokenStream,
        warnings: &mut Vec<String>,
    ) -> Vec<CodeGroup> {
        let Some(codes) = self.codes() else {
            return groups;
        };

        let (kept, discarded): (Vec<CodeGroup>, Vec<CodeGroup>) = groups
            .into_iter()
            .partition(|group| codes.contains(group.code(tokens)));

        if !discarded.is_empty() {
            let names: Vec<&str> = discarded.iter().map(|g| g.code(tokens)).collect();
            debug!("Discarded codes not in the reference list: {:?}", names);
            warnings.push(format!(
                "Discarded {} codes not in the reference list: {}",
                names.len(),
                names.join(", ")
            ));
        }
        kept
    }
}

impl StatementExtractor for StatementParser {
    fn extract(&self, pages: &[Vec<String>]) -> Result<Statement> {
        self.extract_pages(pages)
    }

    fn extract_from_text(&self, text: &str) -> Result<Statement> {
        let lines: Vec<&str> = text.lines().collect();
        self.extract_pages(&[lines])
    }
}
