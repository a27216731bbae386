use serde_json::{Map, Value};

/// Result of recovering a grading object from free-form provider text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Extraction {
    Parsed(GradingPayload),
    Unparseable,
}

/// The parts of the provider's JSON the normalizer cares about.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradingPayload {
    pub(crate) scores: Map<String, Value>,
    pub(crate) feedback: Option<Value>,
}

/// Two-stage parse: the fence-stripped text as a whole, then the outermost
/// `{ ... }` slice. Pure; no I/O.
pub(crate) fn extract(text: &str) -> Extraction {
    let candidate = strip_code_fence(text);

    let parsed = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Some(value),
        Err(_) => braced_slice(candidate).and_then(|slice| serde_json::from_str(slice).ok()),
    };

    parsed.and_then(into_payload).map_or(Extraction::Unparseable, Extraction::Parsed)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };

    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn braced_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn into_payload(value: Value) -> Option<GradingPayload> {
    let Value::Object(mut root) = value else {
        return None;
    };

    let Some(Value::Object(scores)) = root.remove("scores") else {
        return None;
    };

    Some(GradingPayload { scores, feedback: root.remove("feedback") })
}
