use crate::core::prompts::PromptTask;
use crate::domain::model::DEFAULT_WELLBEING_SCORE;
use crate::domain::settings::ParseMode;
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub type Fields = Map<String, Value>;

pub const WELLBEING_KEY: &str = "wellbeing_score";

fn score_phrase_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\bwell-being score of (10|[1-9])\b").expect("valid score phrase pattern")
    })
}

/// Turns raw model text into a JSON object according to `mode`.
pub fn parse_response(raw: &str, mode: ParseMode, task: PromptTask) -> Result<Fields> {
    match mode {
        ParseMode::Strict => parse_strict(raw),
        ParseMode::Lenient => {
            if task == PromptTask::PredictWellbeing {
                if let Some(score) = score_from_phrase(raw) {
                    let mut fields = Fields::new();
                    fields.insert(WELLBEING_KEY.to_string(), Value::from(score));
                    return Ok(fields);
                }
            }
            parse_embedded(raw)
        }
    }
}

fn parse_strict(raw: &str) -> Result<Fields> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(EtlError::ResponseParseError {
            message: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
        Err(e) => Err(EtlError::ResponseParseError {
            message: format!("invalid JSON: {}", e),
        }),
    }
}

/// Parses the first JSON value that starts at a `{`, ignoring surrounding prose.
fn parse_embedded(raw: &str) -> Result<Fields> {
    let Some(start) = raw.find('{') else {
        return Err(EtlError::ResponseParseError {
            message: "no JSON object in response".to_string(),
        });
    };

    let mut values = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
    match values.next() {
        Some(Ok(Value::Object(fields))) => Ok(fields),
        Some(Ok(other)) => Err(EtlError::ResponseParseError {
            message: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
        Some(Err(e)) => Err(EtlError::ResponseParseError {
            message: format!("invalid embedded JSON: {}", e),
        }),
        None => Err(EtlError::ResponseParseError {
            message: "no JSON object in response".to_string(),
        }),
    }
}

pub fn score_from_phrase(raw: &str) -> Option<u8> {
    score_phrase_pattern()
        .captures(raw)
        .and_then(|caps| caps[1].parse().ok())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Evidence spans: a list (strings kept, other scalars stringified) or one string.
pub fn string_list(fields: &Fields, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Score in 1..=10 from an integer, float or numeric string; anything else is the default.
pub fn wellbeing_score(fields: &Fields) -> u8 {
    let numeric = match fields.get(WELLBEING_KEY) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    numeric
        .filter(|v| v.is_finite())
        .map(f64::round)
        .filter(|v| (1.0..=10.0).contains(v))
        .map(|v| v as u8)
        .unwrap_or(DEFAULT_WELLBEING_SCORE)
}

pub fn text_field(fields: &Fields, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
