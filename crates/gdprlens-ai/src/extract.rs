//! Locate and parse the JSON object inside model-generated prose.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("No valid JSON found")]
    NoObject,
    #[error("JSON decode error: {0}")]
    Decode(String),
}

/// The first balanced `{...}` span in `text`.
///
/// Scanning starts at the first `{`. Braces inside JSON string literals
/// (including escaped quotes) do not count toward the nesting depth. Returns
/// `None` when that first object never closes.
pub fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract the first JSON object from `text` and parse it strictly.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let span = json_object_span(text).ok_or(ExtractError::NoObject)?;
    serde_json::from_str(span).map_err(|e| ExtractError::Decode(e.to_string()))
}
