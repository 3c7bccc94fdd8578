//! Utilities for extracting structured data from model responses.
//!
//! Vision-model responses often contain JSON wrapped in markdown code blocks
//! or mixed with explanatory text. This module provides robust extraction
//! utilities that handle common response patterns; phases treat a miss as
//! "no structured data", never as a hard failure.

use marquee_core::ExtractionResponse;
use marquee_error::{MarqueeResult, ParseError};
use serde_json::{Map, Value};

/// Extract JSON from a response that may contain markdown or extra text.
///
/// This function tries multiple extraction strategies:
/// 1. Markdown code blocks: ```json ... ```
/// 2. Balanced braces: { ... }
/// 3. Balanced brackets: [ ... ]
///
/// # Errors
///
/// Returns an error if no valid JSON is found in the response.
///
/// # Examples
///
/// ```
/// use marquee_pipeline::extract_json;
///
/// let response = "Here's what I can read:\n\
///     \n\
///     ```json\n\
///     {\"venue\": \"The Tivoli\", \"city\": \"Brisbane\"}\n\
///     ```\n";
///
/// let json = extract_json(response).unwrap();
/// assert!(json.contains("Tivoli"));
/// ```
pub fn extract_json(response: &str) -> MarqueeResult<String> {
    // Strategy 1: Extract from markdown code blocks
    if let Some(json) = extract_from_code_block(response, "json") {
        return Ok(json);
    }

    // Strategy 2: balanced structures, preferring whichever opens first
    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');

    match (bracket_pos, brace_pos) {
        (Some(b_pos), Some(c_pos)) if b_pos < c_pos => {
            if let Some(json) = extract_balanced(response, '[', ']') {
                return Ok(json);
            }
            if let Some(json) = extract_balanced(response, '{', '}') {
                return Ok(json);
            }
        }
        (Some(_), None) => {
            if let Some(json) = extract_balanced(response, '[', ']') {
                return Ok(json);
            }
        }
        _ => {
            if let Some(json) = extract_balanced(response, '{', '}') {
                return Ok(json);
            }
            if let Some(json) = extract_balanced(response, '[', ']') {
                return Ok(json);
            }
        }
    }

    tracing::debug!(
        response_length = response.len(),
        "No JSON found in model response"
    );

    Err(ParseError::new(format!(
        "No JSON found in response (length: {})",
        response.len()
    ))
    .into())
}

/// Extract content from markdown code blocks.
///
/// Looks for patterns like:
/// - ```language\n...\n```
/// - ``` ... ``` (no language specified)
fn extract_from_code_block(response: &str, language: &str) -> Option<String> {
    let pattern = format!("```{}", language);

    if let Some(start) = response.find(&pattern) {
        let content_start = start + pattern.len();
        if let Some(end) = response[content_start..].find("```") {
            let content = &response[content_start..content_start + end];
            return Some(content.trim().to_string());
        }
        // No closing fence found - likely truncated response
        return Some(response[content_start..].trim().to_string());
    }

    // Try without language specifier
    if let Some(start) = response.find("```") {
        let content_start = start + 3;
        // Skip to next newline (in case there's a language specifier)
        let skip_to = response[content_start..]
            .find('\n')
            .map(|n| content_start + n + 1)
            .unwrap_or(content_start);

        if let Some(end) = response[skip_to..].find("```") {
            let content = &response[skip_to..skip_to + end];
            return Some(content.trim().to_string());
        }
        return Some(response[skip_to..].trim().to_string());
    }

    None
}

/// Extract content between balanced delimiters.
///
/// Finds the first occurrence of `open` and extracts content up to the
/// matching `close`, handling nesting and string literals correctly.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse and validate JSON, returning a specific type.
///
/// # Errors
///
/// Returns an error if the JSON string cannot be parsed into type `T`.
pub fn parse_json<T>(json_str: &str) -> MarqueeResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(json_str).map_err(|e| {
        let preview = json_str.chars().take(100).collect::<String>();

        tracing::debug!(
            error = %e,
            json_preview = %preview,
            "JSON parsing failed"
        );

        ParseError::new(format!("Failed to parse JSON: {} (JSON: {}...)", e, preview)).into()
    })
}

/// Best-effort structured object from a provider response.
///
/// Prefers the backend-parsed `structured_data` when it is a JSON object,
/// then falls back to scanning the raw text. Returns `None` rather than an
/// error: phases degrade to conservative defaults on a miss.
pub fn structured_object(response: &ExtractionResponse) -> Option<Map<String, Value>> {
    if let Some(Value::Object(map)) = &response.structured_data {
        return Some(map.clone());
    }

    let json = extract_json(&response.extracted_text).ok()?;
    match serde_json::from_str::<Value>(&json) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Read a non-empty string field from a structured object.
pub(crate) fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a numeric field from a structured object, accepting number or
/// number-as-string.
pub(crate) fn number_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a list of non-empty strings from a structured object.
pub(crate) fn string_list_field(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => {
                    let trimmed = s.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                }
                _ => None,
            })
            .collect(),
        // Tolerate a single string where a list was requested
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
        _ => Vec::new(),
    }
}
