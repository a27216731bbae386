use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_rfc3339;
use crate::services::grading::{GradeReport, RubricScores, MAX_TOTAL};

/// Text fields of the multipart submission, already trimmed.
#[derive(Debug, Validate)]
pub(crate) struct SubmissionForm {
    #[validate(length(min = 1, max = 200, message = "name must be 1..200 characters"))]
    pub(crate) name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ReportFormat {
    #[default]
    Json,
    Html,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubmitQuery {
    #[serde(default)]
    pub(crate) format: ReportFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeResponse<'a> {
    pub(crate) success: bool,
    pub(crate) name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) scores: &'a RubricScores,
    pub(crate) total: u32,
    pub(crate) max_total: u32,
    pub(crate) feedback: &'a str,
    pub(crate) evaluated: bool,
    pub(crate) graded_at: String,
}

impl<'a> From<&'a GradeReport> for GradeResponse<'a> {
    fn from(report: &'a GradeReport) -> Self {
        Self {
            success: true,
            name: report.name(),
            email: report.email(),
            scores: report.scores(),
            total: report.total(),
            max_total: MAX_TOTAL,
            feedback: report.feedback(),
            evaluated: report.evaluated(),
            graded_at: format_rfc3339(report.graded_at()),
        }
    }
}
