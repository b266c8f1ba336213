//! WASM bindings for Russian financial statement OCR.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.
//! Pages are passed as arrays of string arrays, the shape the OCR step
//! produces.

use wasm_bindgen::prelude::*;

use otchet_core::statement::rules;
use otchet_core::{
    CodeList, ExtractionError, ExtractionResult, InputFormat, OcrDocument, StatementParser,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn pages_from_js(pages: JsValue) -> Result<Vec<Vec<String>>, JsValue> {
    serde_wasm_bindgen::from_value(pages)
        .map_err(|e| JsValue::from_str(&format!("expected an array of string arrays: {}", e)))
}

/// Extract line items from OCR pages with default settings.
///
/// Returns the result record: `{items}` on success, `{error, items, diagnostics}`
/// when nothing could be extracted. Throws only when `pages` has the wrong shape.
#[wasm_bindgen]
pub fn extract_statement(pages: JsValue) -> Result<JsValue, JsValue> {
    let pages = pages_from_js(pages)?;
    to_js(&StatementParser::new().extract_result(&pages))
}

/// Parse a statement value cell (e.g., "(1 234)" or "-").
#[wasm_bindgen]
pub fn parse_sum(token: &str) -> Option<f64> {
    rules::parse_sum(token).map(|sum| sum.value() as f64)
}

/// Statement extractor class for browser use.
#[wasm_bindgen]
pub struct StatementExtractor {
    parser: StatementParser,
}

#[wasm_bindgen]
impl StatementExtractor {
    /// Create a new statement extractor.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: StatementParser::new(),
        }
    }

    /// Load the reference code list (one code per line).
    ///
    /// Returns the number of codes loaded.
    #[wasm_bindgen]
    pub fn set_codes(&mut self, text: &str) -> usize {
        let codes = CodeList::parse(text);
        let count = codes.len();
        self.parser = self.parser.clone().with_codes(codes);
        count
    }

    /// Set the period end (YYYY-MM-DD) that anchors default dates.
    #[wasm_bindgen]
    pub fn set_period_end(&mut self, date: &str) -> Result<(), JsValue> {
        let period_end = date
            .parse()
            .map_err(|e| JsValue::from_str(&format!("invalid date {}: {}", date, e)))?;
        self.parser = self.parser.clone().with_period_end(period_end);
        Ok(())
    }

    /// Extract line items from pages.
    #[wasm_bindgen]
    pub fn extract(&self, pages: JsValue) -> Result<JsValue, JsValue> {
        let pages = pages_from_js(pages)?;
        to_js(&self.parser.extract_result(&pages))
    }

    /// Extract line items from a quoted fragment dump (`['…', '…']`).
    #[wasm_bindgen]
    pub fn extract_quoted(&self, text: &str) -> Result<JsValue, JsValue> {
        let result: ExtractionResult = match OcrDocument::parse(text, InputFormat::Quoted) {
            Ok(document) => self.parser.extract_result(&document.pages),
            Err(_) => ExtractionError::EmptyInput.into(),
        };
        to_js(&result)
    }

    /// Get the full statement: form, column dates with provenance, items, warnings.
    #[wasm_bindgen]
    pub fn extract_with_metadata(&self, pages: JsValue) -> Result<JsValue, JsValue> {
        let pages = pages_from_js(pages)?;
        match self.parser.extract_pages(&pages) {
            Ok(statement) => to_js(&statement),
            Err(e) => to_js(&ExtractionResult::from(e)),
        }
    }
}

impl Default for StatementExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn pages(tokens: &[&str]) -> JsValue {
        serde_wasm_bindgen::to_value(&vec![tokens.to_vec()]).unwrap()
    }

    fn result(value: JsValue) -> ExtractionResult {
        serde_wasm_bindgen::from_value(value).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_parse_sum() {
        assert_eq!(parse_sum("37 992"), Some(37992.0));
        assert_eq!(parse_sum("(1 200)"), Some(-1200.0));
        assert_eq!(parse_sum("-"), Some(0.0));
        assert_eq!(parse_sum("итого"), None);
    }

    #[wasm_bindgen_test]
    fn test_extract_statement() {
        let value = extract_statement(pages(&["Прочие доходы", "2510", "-", "-", "7018"])).unwrap();
        let result = result(value);

        assert!(result.is_success());
        let sums: Vec<i64> = result.items.iter().map(|i| i.sum).collect();
        assert_eq!(sums, vec![0, 0, 7018]);
    }

    #[wasm_bindgen_test]
    fn test_extract_quoted_with_codes() {
        let mut extractor = StatementExtractor::new();
        assert_eq!(extractor.set_codes("1110\n1120\n"), 2);

        let value = extractor
            .extract_quoted("['1110', '1120', '1130']")
            .unwrap();
        let result = result(value);

        let codes: Vec<&str> = result.items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["1110", "1110", "1110", "1120", "1120", "1120"]);
    }

    #[wasm_bindgen_test]
    fn test_empty_input_record() {
        let value = extract_statement(pages(&[])).unwrap();
        let result = result(value);

        assert_eq!(result.error.as_deref(), Some("no valid lines found"));
        assert!(result.items.is_empty());
    }

    #[wasm_bindgen_test]
    fn test_rejects_wrong_shape() {
        assert!(extract_statement(JsValue::from_str("not pages")).is_err());
    }
}
