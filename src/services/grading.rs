mod extract;
mod normalize;

use std::time::Instant;

use serde::Serialize;
use time::OffsetDateTime;

use crate::services::providers::{ImagePayload, VisionProvider};

pub(crate) use extract::{extract, Extraction};
pub(crate) use normalize::{fallback, normalize, Normalized};
#[cfg(test)]
pub(crate) use normalize::FALLBACK_FEEDBACK;

/// Highest possible total across all categories.
pub(crate) const MAX_TOTAL: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RubricCategory {
    Sketch,
    Description,
    Dimensions,
    Scale,
    Compass,
    Differences,
}

impl RubricCategory {
    pub(crate) const ALL: [RubricCategory; 6] = [
        RubricCategory::Sketch,
        RubricCategory::Description,
        RubricCategory::Dimensions,
        RubricCategory::Scale,
        RubricCategory::Compass,
        RubricCategory::Differences,
    ];

    pub(crate) fn key(self) -> &'static str {
        match self {
            RubricCategory::Sketch => "sketch",
            RubricCategory::Description => "description",
            RubricCategory::Dimensions => "dimensions",
            RubricCategory::Scale => "scale",
            RubricCategory::Compass => "compass",
            RubricCategory::Differences => "differences",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            RubricCategory::Sketch => "Sketch Quality",
            RubricCategory::Description => "Description",
            RubricCategory::Dimensions => "Dimensions",
            RubricCategory::Scale => "Scale",
            RubricCategory::Compass => "Compass",
            RubricCategory::Differences => "Differences Noted",
        }
    }

    pub(crate) fn max(self) -> u32 {
        match self {
            RubricCategory::Sketch | RubricCategory::Description | RubricCategory::Dimensions => 25,
            RubricCategory::Scale | RubricCategory::Compass => 10,
            RubricCategory::Differences => 5,
        }
    }

    /// Clamps an arbitrary AI-provided value into `[0, max]`.
    pub(crate) fn clamp(self, value: i64) -> u32 {
        value.clamp(0, i64::from(self.max())) as u32
    }
}

/// One bounded score per rubric category.
///
/// Fields are private so every value passes through [`RubricCategory::clamp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct RubricScores {
    sketch: u32,
    description: u32,
    dimensions: u32,
    scale: u32,
    compass: u32,
    differences: u32,
}

impl RubricScores {
    pub(crate) fn zero() -> Self {
        Self::default()
    }

    /// Builds scores from raw values, clamping each into its category range.
    pub(crate) fn from_raw(mut raw: impl FnMut(RubricCategory) -> i64) -> Self {
        let mut scores = Self::zero();
        for category in RubricCategory::ALL {
            *scores.slot(category) = category.clamp(raw(category));
        }
        scores
    }

    pub(crate) fn get(&self, category: RubricCategory) -> u32 {
        match category {
            RubricCategory::Sketch => self.sketch,
            RubricCategory::Description => self.description,
            RubricCategory::Dimensions => self.dimensions,
            RubricCategory::Scale => self.scale,
            RubricCategory::Compass => self.compass,
            RubricCategory::Differences => self.differences,
        }
    }

    pub(crate) fn total(&self) -> u32 {
        RubricCategory::ALL.iter().map(|category| self.get(*category)).sum()
    }

    fn slot(&mut self, category: RubricCategory) -> &mut u32 {
        match category {
            RubricCategory::Sketch => &mut self.sketch,
            RubricCategory::Description => &mut self.description,
            RubricCategory::Dimensions => &mut self.dimensions,
            RubricCategory::Scale => &mut self.scale,
            RubricCategory::Compass => &mut self.compass,
            RubricCategory::Differences => &mut self.differences,
        }
    }
}

/// Final, immutable grade for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GradeReport {
    name: String,
    email: String,
    scores: RubricScores,
    total: u32,
    feedback: String,
    evaluated: bool,
    graded_at: OffsetDateTime,
}

impl GradeReport {
    pub(crate) fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        normalized: Normalized,
        graded_at: OffsetDateTime,
    ) -> Self {
        let Normalized { scores, feedback, evaluated } = normalized;
        Self {
            name: name.into(),
            email: email.into(),
            total: scores.total(),
            scores,
            feedback,
            evaluated,
            graded_at,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn scores(&self) -> &RubricScores {
        &self.scores
    }

    pub(crate) fn total(&self) -> u32 {
        self.total
    }

    pub(crate) fn feedback(&self) -> &str {
        &self.feedback
    }

    pub(crate) fn evaluated(&self) -> bool {
        self.evaluated
    }

    pub(crate) fn graded_at(&self) -> OffsetDateTime {
        self.graded_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GradingOutcome {
    Graded,
    Unparseable,
    ProviderError,
}

impl GradingOutcome {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            GradingOutcome::Graded => "graded",
            GradingOutcome::Unparseable => "unparseable",
            GradingOutcome::ProviderError => "provider_error",
        }
    }
}

/// Sends the sketch to the provider and turns whatever comes back into scores.
///
/// Provider and parse failures both degrade to [`fallback`]; this never errors.
pub(crate) async fn grade_sketch(
    provider: &dyn VisionProvider,
    prompt: &str,
    image: &ImagePayload,
) -> (Normalized, GradingOutcome) {
    let timer = Instant::now();
    let response = provider.evaluate(prompt, image).await;
    metrics::histogram!("provider_request_duration_seconds", "provider" => provider.name())
        .record(timer.elapsed().as_secs_f64());

    let (normalized, outcome) = match response {
        Ok(text) => match extract(&text) {
            extraction @ Extraction::Parsed(_) => (normalize(&extraction), GradingOutcome::Graded),
            Extraction::Unparseable => {
                tracing::info!(
                    provider = provider.name(),
                    response_len = text.len(),
                    "Provider response was not a grading object; applying fallback"
                );
                (fallback(), GradingOutcome::Unparseable)
            }
        },
        Err(err) => {
            tracing::warn!(
                provider = provider.name(),
                status = err.status_code(),
                error = %err,
                "Provider call failed; applying fallback"
            );
            (fallback(), GradingOutcome::ProviderError)
        }
    };

    metrics::counter!("grading_outcomes_total", "outcome" => outcome.as_str()).increment(1);
    (normalized, outcome)
}
