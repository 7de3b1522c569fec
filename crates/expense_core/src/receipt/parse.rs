//! Defensive parsing of the endpoint's free-form reply.
//!
//! # Responsibility
//! - Navigate the response envelope to the generated text.
//! - Turn best-effort model text into typed receipt fields or a typed failure.
//!
//! # Invariants
//! - No step substitutes a default for a field the model failed to supply.
//! - Every failure carries the text it rejected.

use super::error::{AnalysisError, AnalysisResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

const PAYLOAD_KEYS: [&str; 3] = ["name", "amount", "category"];

static CODE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[ \t]*[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)\s*```$").expect("valid code fence regex")
});

/// Receipt fields as the model returned them.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptPayload {
    pub name: String,
    /// Number or loosely formatted string; see [`normalize_amount`].
    pub amount: Value,
    pub category: String,
}

/// Returns the first text part of `candidates[0].content.parts`.
pub fn extract_candidate_text(body: &str) -> AnalysisResult<String> {
    let malformed = || AnalysisError::MalformedResponse {
        body: body.to_string(),
    };
    let envelope: Value = serde_json::from_str(body).map_err(|_| malformed())?;

    envelope["candidates"][0]["content"]["parts"]
        .as_array()
        .and_then(|parts| parts.iter().find_map(|part| part["text"].as_str()))
        .map(str::to_string)
        .ok_or_else(malformed)
}

/// Removes a surrounding markdown code fence (optionally language-tagged)
/// and outer whitespace. Unfenced text is only trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match CODE_FENCE_RE
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
    {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parses cleaned model text as an object with exactly `name`, `amount`
/// and `category`.
pub fn parse_receipt_payload(text: &str) -> AnalysisResult<ReceiptPayload> {
    let unparseable = |reason: String| AnalysisError::UnparseablePayload {
        text: text.to_string(),
        reason,
    };

    let value: Value =
        serde_json::from_str(text).map_err(|err| unparseable(format!("invalid JSON: {err}")))?;
    let Value::Object(mut object) = value else {
        return Err(unparseable("expected a JSON object".to_string()));
    };

    if let Some(extra) = object
        .keys()
        .find(|key| !PAYLOAD_KEYS.contains(&key.as_str()))
    {
        return Err(unparseable(format!("unexpected key `{extra}`")));
    }

    let name = take_string(&mut object, "name").map_err(unparseable)?;
    let amount = object
        .remove("amount")
        .ok_or_else(|| unparseable("missing key `amount`".to_string()))?;
    let category = take_string(&mut object, "category").map_err(unparseable)?;

    Ok(ReceiptPayload {
        name,
        amount,
        category,
    })
}

/// Normalizes a model-supplied amount into a positive decimal.
///
/// Numbers are used as-is. Strings keep only ASCII digits and `.` before
/// parsing, so `"$12.50"` becomes `12.5` and `"12,50"` becomes `1250`.
pub fn normalize_amount(value: &Value) -> AnalysisResult<f64> {
    let invalid = || AnalysisError::InvalidAmount {
        raw: match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        },
    };

    let amount = match value {
        Value::Number(number) => number.as_f64().ok_or_else(invalid)?,
        Value::String(text) => {
            let scrubbed: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if !scrubbed.chars().any(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            scrubbed.parse::<f64>().map_err(|_| invalid())?
        }
        _ => return Err(invalid()),
    };

    if !amount.is_finite() || amount <= 0.0 {
        return Err(invalid());
    }
    Ok(amount)
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Result<String, String> {
    match object.remove(key) {
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(format!("key `{key}` must be a string, got {other}")),
        None => Err(format!("missing key `{key}`")),
    }
}
