//! Parse model output into typed field values
//!
//! Models wrap JSON in prose or code fences often enough that parsing starts
//! by locating the first balanced object. Nothing here panics or returns an
//! error: a response either parses or carries a reason it did not.

use gonggo_domain::{Field, FieldValue, PatternSuggestion};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Result of interpreting a model response
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// Response was understood
    Parsed(T),
    /// Response could not be read, with the reason
    Failed(String),
}

impl<T> ParseOutcome<T> {
    /// The parsed value, if any
    pub fn ok(self) -> Option<T> {
        match self {
            ParseOutcome::Parsed(v) => Some(v),
            ParseOutcome::Failed(_) => None,
        }
    }

    /// Whether parsing failed
    pub fn is_failed(&self) -> bool {
        matches!(self, ParseOutcome::Failed(_))
    }
}

/// Parsed answer of the escalation tier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tier3Response {
    /// Non-null values that fit their field's kind
    pub fields: BTreeMap<Field, FieldValue>,
    /// Model rationale
    pub reasoning: String,
    /// Well-formed suggestions; malformed entries are dropped
    pub suggestions: Vec<PatternSuggestion>,
}

/// The first balanced `{...}` substring of `text`
///
/// Braces inside JSON strings (including escaped quotes) are ignored. If an
/// opening brace never closes, the search resumes at the next one.
///
/// # Examples
///
/// ```
/// use gonggo_extractor::extract_json_object;
///
/// let text = "Here you go:\n```json\n{\"deadline\": \"2025-03-15\"}\n```";
/// assert_eq!(extract_json_object(text), Some("{\"deadline\": \"2025-03-15\"}"));
/// assert_eq!(extract_json_object("no json here"), None);
/// ```
pub fn extract_json_object(text: &str) -> Option<&str> {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .find_map(|(start, _)| balanced_end(&text[start..]).map(|len| &text[start..start + len]))
}

/// Byte length of the object starting at the first byte of `text`
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
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
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    let json = extract_json_object(text).ok_or_else(|| "No JSON object in response".to_string())?;
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("Response JSON is not an object".to_string()),
        Err(e) => Err(format!("JSON parse error: {}", e)),
    }
}

/// Read a focused-tier answer for `requested` fields
///
/// Every requested field gets an entry. Values that are null, the string
/// `"null"`, or do not fit the field's kind map to `None`, as do fields the
/// model left out. Keys that were not requested are ignored.
pub fn parse_tier2_response(
    text: &str,
    requested: &[Field],
) -> ParseOutcome<BTreeMap<Field, Option<FieldValue>>> {
    let object = match parse_object(text) {
        Ok(object) => object,
        Err(reason) => return ParseOutcome::Failed(reason),
    };

    let values = requested
        .iter()
        .map(|field| {
            let value = object
                .get(field.key())
                .and_then(|raw| FieldValue::coerce(field.kind(), raw));
            (*field, value)
        })
        .collect();

    ParseOutcome::Parsed(values)
}

#[derive(Deserialize)]
struct RawTier3 {
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    pattern_suggestions: Vec<Value>,
}

#[derive(Deserialize)]
struct RawSuggestion {
    field: String,
    #[serde(default)]
    extracted_value: Value,
    #[serde(default)]
    context_snippet: Option<String>,
    #[serde(default)]
    suggested_pattern: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
}

/// Read the escalation tier's `{fields, reasoning, pattern_suggestions}` answer
pub fn parse_tier3_response(text: &str) -> ParseOutcome<Tier3Response> {
    let object = match parse_object(text) {
        Ok(object) => object,
        Err(reason) => return ParseOutcome::Failed(reason),
    };
    let raw: RawTier3 = match serde_json::from_value(Value::Object(object)) {
        Ok(raw) => raw,
        Err(e) => return ParseOutcome::Failed(format!("Unexpected response shape: {}", e)),
    };

    let fields = raw
        .fields
        .iter()
        .filter_map(|(key, raw_value)| {
            let field = Field::from_key(key)?;
            FieldValue::coerce(field.kind(), raw_value).map(|value| (field, value))
        })
        .collect();

    let suggestions = raw
        .pattern_suggestions
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match parse_suggestion(value) {
            Ok(suggestion) => Some(suggestion),
            Err(e) => {
                warn!("Dropping pattern suggestion {}: {}", idx, e);
                None
            }
        })
        .collect();

    ParseOutcome::Parsed(Tier3Response {
        fields,
        reasoning: raw.reasoning.unwrap_or_default(),
        suggestions,
    })
}

fn parse_suggestion(value: Value) -> Result<PatternSuggestion, String> {
    let raw: RawSuggestion = serde_json::from_value(value).map_err(|e| e.to_string())?;
    let field = Field::from_key(&raw.field).ok_or_else(|| format!("unknown field '{}'", raw.field))?;

    let suggested_pattern = raw
        .suggested_pattern
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| "missing suggested_pattern".to_string())?;

    let extracted_value = match raw.extracted_value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    };

    Ok(PatternSuggestion {
        field,
        extracted_value,
        context_snippet: raw.context_snippet.unwrap_or_default(),
        suggested_pattern,
        failure_reason: raw.failure_reason.unwrap_or_default(),
    })
}
