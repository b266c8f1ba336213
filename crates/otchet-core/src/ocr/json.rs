//! JSON layouts written by the OCR step.

use serde_json::{Map, Value};

use super::{OcrWord, Result};
use crate::error::InputError;

/// Keys under which PaddleOCR page objects keep their fragments.
const FRAGMENT_KEYS: [&str; 3] = ["rec_texts", "words", "tdata"];

pub(super) fn looks_like_json(content: &str) -> bool {
    serde_json::from_str::<Value>(content).is_ok()
}

pub(super) fn pages_from_str(content: &str) -> Result<Vec<Vec<String>>> {
    let value: Value = serde_json::from_str(content.trim_start_matches('\u{feff}'))?;
    pages_from_value(&value)
}

fn pages_from_value(value: &Value) -> Result<Vec<Vec<String>>> {
    match value {
        Value::Array(items) if items.iter().all(is_fragment) => {
            let mut page = Vec::new();
            flatten_into(value, &mut page);
            Ok(vec![page])
        }
        Value::Array(items) => items.iter().map(page_from_value).collect(),
        Value::Object(map) => match map.get("pages") {
            Some(pages) => pages_from_value(pages),
            None => Ok(vec![page_from_object(map)?]),
        },
        other => Err(InputError::UnsupportedShape(format!(
            "expected an array or object, found {}",
            kind(other)
        ))),
    }
}

fn page_from_value(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Object(map) => page_from_object(map),
        _ => {
            let mut page = Vec::new();
            flatten_into(value, &mut page);
            Ok(page)
        }
    }
}

fn page_from_object(map: &Map<String, Value>) -> Result<Vec<String>> {
    for key in FRAGMENT_KEYS {
        if let Some(fragments) = map.get(key) {
            let mut page = Vec::new();
            flatten_into(fragments, &mut page);
            return Ok(page);
        }
    }

    match map.get("text") {
        Some(Value::String(text)) => Ok(text.lines().map(str::to_string).collect()),
        _ => Err(InputError::UnsupportedShape(format!(
            "page object has none of {:?} or \"text\"",
            FRAGMENT_KEYS
        ))),
    }
}

/// Scalars and word objects are fragments; arrays nest.
fn is_fragment(value: &Value) -> bool {
    match value {
        Value::Array(_) => false,
        Value::Object(map) => map.contains_key("text"),
        _ => true,
    }
}

fn flatten_into(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(_) => {
            if let Ok(word) = serde_json::from_value::<OcrWord>(value.clone()) {
                out.push(word.text);
            }
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
