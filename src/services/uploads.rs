use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::services::providers::ImagePayload;

/// An uploaded sketch parked on disk for the lifetime of one request.
///
/// The file is removed when the guard is dropped, including on early returns
/// and panics. [`TempUpload::cleanup`] removes it eagerly and logs failures.
#[derive(Debug)]
pub(crate) struct TempUpload {
    file: NamedTempFile,
    extension: String,
}

impl TempUpload {
    pub(crate) async fn persist(dir: &Path, extension: &str, bytes: &[u8]) -> Result<Self> {
        let suffix = format!(".{extension}");
        let file = tempfile::Builder::new()
            .prefix("sketch-")
            .suffix(&suffix)
            .tempfile_in(dir)
            .with_context(|| format!("Failed to create temp upload in {}", dir.display()))?;

        let handle = file.as_file().try_clone().context("Failed to open temp upload")?;
        let mut writer = tokio::fs::File::from_std(handle);
        writer.write_all(bytes).await.context("Failed to write temp upload")?;
        writer.flush().await.context("Failed to flush temp upload")?;

        tracing::debug!(path = %file.path().display(), bytes = bytes.len(), "Stored upload");
        Ok(Self { file, extension: extension.to_string() })
    }

    pub(crate) fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the stored image back for the provider call.
    pub(crate) async fn load_payload(&self) -> Result<ImagePayload> {
        let bytes = tokio::fs::read(self.path())
            .await
            .with_context(|| format!("Failed to read temp upload {}", self.path().display()))?;
        Ok(ImagePayload::new(bytes, &self.extension))
    }

    pub(crate) fn cleanup(self) {
        let path: PathBuf = self.file.path().to_path_buf();
        if let Err(err) = self.file.close() {
            tracing::warn!(error = %err, path = %path.display(), "Failed to remove temp upload");
        }
    }
}
