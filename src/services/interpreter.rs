//! Recovery of structured results from unreliable model output.
//!
//! The prompt demands strict JSON but deployed models wrap it in prose,
//! fence it in markdown, or emit `"X" or "Y"` alternatives inside mapping
//! values. Interpretation tries an ordered list of strategies and always
//! lands on a value; the caller can tell a degraded parse apart from a
//! clean "no issues" result only by the all-empty-bundle signature, which
//! is intentional.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::models::FeedbackBundle;

/// Some model snapshots answer the tutor prompt with this plain-text
/// prefix instead of JSON.
const TUTOR_MESSAGE_SENTINEL: &str = "tutor_message:";

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

static ALTERNATIVE_PHRASING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)" or "[^"]+""#).expect("valid repair pattern"));

#[derive(Debug, Clone, PartialEq)]
pub struct TutorInterpretation {
    pub tutor_message: String,
    pub feedback: FeedbackBundle,
    pub needs_correction: bool,
}

impl TutorInterpretation {
    fn degraded() -> Self {
        Self {
            tutor_message: String::new(),
            feedback: FeedbackBundle::default(),
            needs_correction: false,
        }
    }
}

/// Collapses `"X" or "Y"` to `"X"` inside responses that carry grammar
/// feedback. Iterates to a fixed point so a repaired string passes through
/// unchanged.
pub fn repair_alternative_phrasing(raw: &str) -> Cow<'_, str> {
    if !raw.contains("\"grammar_errors\"") || !ALTERNATIVE_PHRASING.is_match(raw) {
        return Cow::Borrowed(raw);
    }

    let mut current = ALTERNATIVE_PHRASING.replace_all(raw, "\"$1\"").into_owned();
    loop {
        let next = ALTERNATIVE_PHRASING.replace_all(&current, "\"$1\"").into_owned();
        if next == current {
            return Cow::Owned(current);
        }
        current = next;
    }
}

/// Returns the contents of the first ```json fenced block, if any.
fn extract_fenced_json(raw: &str) -> Option<&str> {
    let start = raw.find(FENCE_OPEN)? + FENCE_OPEN.len();
    let rest = &raw[start..];
    let end = rest.find(FENCE_CLOSE)?;
    Some(rest[..end].trim())
}

fn parse_object(candidate: &str) -> Option<Value> {
    let repaired = repair_alternative_phrasing(candidate);
    let value: Value = serde_json::from_str(repaired.trim()).ok()?;
    value.is_object().then_some(value)
}

/// First JSON object recoverable from the raw text: fenced block first,
/// then the whole response.
fn recover_object(raw: &str) -> Option<Value> {
    extract_fenced_json(raw)
        .and_then(parse_object)
        .or_else(|| parse_object(raw))
}

fn bundle_from_value(value: &Value) -> Option<FeedbackBundle> {
    match value {
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        // Historical contract: feedback arrived as a JSON-encoded string.
        Value::String(inner) => serde_json::from_str(inner).ok(),
        _ => None,
    }
}

/// Interprets a tutor-mode response. Total: unparseable input degrades to
/// an empty bundle with `needs_correction = false` and no message.
pub fn interpret_tutor(raw: &str) -> TutorInterpretation {
    let trimmed = raw.trim();

    if let Some(message) = trimmed.strip_prefix(TUTOR_MESSAGE_SENTINEL) {
        return TutorInterpretation {
            tutor_message: message.trim().to_string(),
            feedback: FeedbackBundle::default(),
            needs_correction: false,
        };
    }

    let Some(object) = recover_object(trimmed) else {
        return TutorInterpretation::degraded();
    };

    let tutor_message = object
        .get("tutor_message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let feedback = object
        .get("feedback")
        .and_then(bundle_from_value)
        // Tolerate the four collections sitting at the top level.
        .or_else(|| {
            object
                .get("feedback")
                .is_none()
                .then(|| bundle_from_value(&object))
                .flatten()
        })
        .unwrap_or_default();

    let needs_correction = !feedback.is_empty();

    TutorInterpretation {
        tutor_message,
        feedback,
        needs_correction,
    }
}

/// Interprets a partner-mode response. Free text is a valid reply, so the
/// trimmed raw text is the terminal fallback.
pub fn interpret_partner(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(object) = parse_object(trimmed) {
        if let Some(message) = object.get("message").and_then(Value::as_str) {
            let message = message.trim();
            if !message.is_empty() {
                return message.to_string();
            }
        }
    }

    trimmed.to_string()
}
