use std::path::{Path, PathBuf};

use thiserror::Error;

/// Line separating the human-facing rubric from the prompt sent to the provider.
pub(crate) const PROMPT_DELIMITER: &str = "=== PROMPT ===";

#[derive(Debug, Error)]
pub(crate) enum RubricError {
    #[error("failed to read rubric file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("rubric file {0} must contain a '=== PROMPT ===' separator line")]
    MissingDelimiter(PathBuf),
    #[error("rubric file {0} has no prompt text after the separator")]
    EmptyPrompt(PathBuf),
}

/// Rubric text shown to students plus the literal grading prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rubric {
    text: String,
    prompt: String,
}

impl Rubric {
    pub(crate) fn load(path: &Path) -> Result<Self, RubricError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| RubricError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&raw, path)
    }

    pub(crate) fn parse(raw: &str, origin: &Path) -> Result<Self, RubricError> {
        let mut rubric_lines = Vec::new();
        let mut lines = raw.lines();

        let mut found = false;
        for line in lines.by_ref() {
            if line.trim() == PROMPT_DELIMITER {
                found = true;
                break;
            }
            rubric_lines.push(line);
        }

        if !found {
            return Err(RubricError::MissingDelimiter(origin.to_path_buf()));
        }

        let prompt = lines.collect::<Vec<_>>().join("\n").trim().to_string();
        if prompt.is_empty() {
            return Err(RubricError::EmptyPrompt(origin.to_path_buf()));
        }

        Ok(Self { text: rubric_lines.join("\n").trim().to_string(), prompt })
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn prompt(&self) -> &str {
        &self.prompt
    }
}
