use serde_json::Value;

use super::extract::Extraction;
use super::{RubricCategory, RubricScores};

/// Feedback used when the provider graded the sketch but said nothing.
pub(crate) const DEFAULT_FEEDBACK: &str = "Great work!";

/// Feedback used whenever the provider's answer cannot be used.
pub(crate) const FALLBACK_FEEDBACK: &str = "We could not evaluate this sketch automatically. \
Please resubmit a clear photo of your drawing or contact your instructor.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Normalized {
    pub(crate) scores: RubricScores,
    pub(crate) feedback: String,
    pub(crate) evaluated: bool,
}

/// All-zero scores. Never a fabricated grade.
pub(crate) fn fallback() -> Normalized {
    Normalized {
        scores: RubricScores::zero(),
        feedback: FALLBACK_FEEDBACK.to_string(),
        evaluated: false,
    }
}

pub(crate) fn normalize(extraction: &Extraction) -> Normalized {
    let Extraction::Parsed(payload) = extraction else {
        return fallback();
    };

    let scores = RubricScores::from_raw(|category: RubricCategory| {
        payload.scores.get(category.key()).and_then(numeric_score).unwrap_or(0)
    });

    let feedback = payload
        .feedback
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_FEEDBACK)
        .to_string();

    Normalized { scores, feedback, evaluated: true }
}

/// Integers pass through, floats truncate toward zero, numeric strings are
/// parsed the same way. `f64 as i64` saturates, so huge values still clamp.
fn numeric_score(value: &Value) -> Option<i64> {
    let raw = match value {
        Value::Number(number) => match number.as_i64() {
            Some(int) => return Some(int),
            None => number.as_f64()?,
        },
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    raw.is_finite().then(|| raw.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::grading::extract::extract;
    use serde_json::json;

    fn normalize_text(text: &str) -> Normalized {
        normalize(&extract(text))
    }

    fn as_json(scores: &RubricScores) -> String {
        json!({"scores": scores}).to_string()
    }

    #[test]
    fn perfect_response_totals_one_hundred() {
        let normalized = normalize_text(
            r#"{"scores":{"sketch":25,"description":25,"dimensions":25,"scale":10,"compass":10,"differences":5},"feedback":"Great job!"}"#,
        );
        assert_eq!(normalized.scores.total(), 100);
        assert_eq!(normalized.feedback, "Great job!");
        assert!(normalized.evaluated);
    }

    #[test]
    fn out_of_range_values_clamp() {
        let normalized =
            normalize_text(r#"{"scores":{"sketch":999,"compass":-5,"differences":6,"scale":10}}"#);
        assert_eq!(normalized.scores.get(RubricCategory::Sketch), 25);
        assert_eq!(normalized.scores.get(RubricCategory::Compass), 0);
        assert_eq!(normalized.scores.get(RubricCategory::Differences), 5);
        assert_eq!(normalized.scores.get(RubricCategory::Scale), 10);
        assert_eq!(normalized.scores.total(), 40);
    }

    #[test]
    fn missing_and_non_numeric_values_default_to_zero() {
        let normalized = normalize_text(
            r#"{"scores":{"sketch":"excellent","description":null,"dimensions":[20],"scale":true}}"#,
        );
        assert_eq!(normalized.scores, RubricScores::zero());
        assert!(normalized.evaluated);
    }

    #[test]
    fn floats_and_numeric_strings_truncate() {
        let normalized = normalize_text(
            r#"{"scores":{"sketch":22.9,"description":" 18 ","dimensions":"12.5","scale":1e3,"compass":-0.5,"differences":18446744073709551615}}"#,
        );
        assert_eq!(normalized.scores.get(RubricCategory::Sketch), 22);
        assert_eq!(normalized.scores.get(RubricCategory::Description), 18);
        assert_eq!(normalized.scores.get(RubricCategory::Dimensions), 12);
        assert_eq!(normalized.scores.get(RubricCategory::Scale), 10);
        assert_eq!(normalized.scores.get(RubricCategory::Compass), 0);
        assert_eq!(normalized.scores.get(RubricCategory::Differences), 5);
    }

    #[test]
    fn feedback_defaults_when_missing_blank_or_not_text() {
        for text in [
            r#"{"scores":{}}"#,
            r#"{"scores":{},"feedback":"   "}"#,
            r#"{"scores":{},"feedback":42}"#,
            r#"{"scores":{},"feedback":{"summary":"nested"}}"#,
        ] {
            assert_eq!(normalize_text(text).feedback, DEFAULT_FEEDBACK, "input: {text}");
        }
        assert_eq!(
            normalize_text(r#"{"scores":{},"feedback":"  Add a north arrow.\n"}"#).feedback,
            "Add a north arrow."
        );
    }

    #[test]
    fn unparseable_text_never_yields_a_grade() {
        for text in ["", "No braces here, just prose.", "{broken"] {
            let normalized = normalize_text(text);
            assert_eq!(normalized.scores.total(), 0);
            assert_eq!(normalized.feedback, FALLBACK_FEEDBACK);
            assert!(!normalized.evaluated);
        }
    }

    #[test]
    fn normalizing_in_bound_scores_is_idempotent() {
        let first = normalize_text(
            r#"{"scores":{"sketch":20,"description":15,"dimensions":25,"scale":3,"compass":10,"differences":0}}"#,
        );
        let second = normalize_text(&as_json(&first.scores));
        let third = normalize_text(&as_json(&second.scores));
        assert_eq!(first.scores, second.scores);
        assert_eq!(second.scores, third.scores);
    }

    #[test]
    fn clamped_scores_are_a_fixed_point() {
        let clamped = normalize_text(r#"{"scores":{"sketch":-1,"description":80,"scale":11}}"#);
        let again = normalize_text(&as_json(&clamped.scores));
        assert_eq!(clamped.scores, again.scores);
        assert!(again.scores.total() <= 100);
    }
}
