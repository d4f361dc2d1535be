//! Upload staging: request-scoped temporary files for multipart uploads.
//!
//! A `StagedUpload` owns a `tempfile::TempPath`; the file is removed when the
//! value is dropped, on every exit path of the handler that owns it. Removal
//! errors (file already gone) are swallowed by `TempPath` and never replace
//! the handler's own outcome.

use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::errors::AppError;

/// Upload cap applied while streaming a field to disk.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Resume,
}

impl UploadKind {
    /// Multipart field name the upload arrives under.
    pub fn field_name(&self) -> &'static str {
        match self {
            UploadKind::Image => "image",
            UploadKind::Resume => "resume",
        }
    }
}

#[derive(Debug)]
pub struct StagedUpload {
    path: TempPath,
    size: u64,
    file_name: Option<String>,
    content_type: Option<String>,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("upload")
    }

    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }

    pub async fn read(&self) -> Result<Vec<u8>, AppError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to read staged upload: {e}")))
    }

    /// Removes the file now instead of at drop. A failed removal is logged only.
    pub fn discard(self) {
        let staged_path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => debug!(path = %staged_path.display(), "Removed staged file"),
            Err(e) => warn!(path = %staged_path.display(), "Staged file was not removed cleanly: {e}"),
        }
    }
}

/// Directory-backed staging area. Each staged path belongs to exactly one request.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
    max_bytes: u64,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }

    fn temp_path(&self, suffix: &str) -> Result<TempPath, AppError> {
        tempfile::Builder::new()
            .prefix("upload-")
            .suffix(suffix)
            .tempfile_in(&self.dir)
            .map(|f| f.into_temp_path())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create staging file: {e}")))
    }

    /// Streams a multipart field to a fresh staging file.
    pub async fn stage_field(
        &self,
        kind: UploadKind,
        mut field: Field<'_>,
    ) -> Result<StagedUpload, AppError> {
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let path = self.temp_path("")?;

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to open staging file: {e}")))?;

        let mut size: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Invalid multipart payload: {e}")))?
        {
            size += chunk.len() as u64;
            if size > self.max_bytes {
                // `path` drops here and takes the partial file with it.
                return Err(AppError::InvalidInput("Uploaded file is too large".to_string()));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write staging file: {e}")))?;
        }
        file.flush()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to flush staging file: {e}")))?;

        debug!("Staged {} upload: {} bytes at {}", kind.field_name(), size, path.display());

        Ok(StagedUpload {
            path,
            size,
            file_name,
            content_type,
        })
    }

    /// Stages bytes produced server-side (e.g. a provider's transformed image).
    pub async fn stage_bytes(
        &self,
        bytes: &[u8],
        suffix: &str,
        content_type: &str,
    ) -> Result<StagedUpload, AppError> {
        let path = self.temp_path(suffix)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write staging file: {e}")))?;
        Ok(StagedUpload {
            path,
            size: bytes.len() as u64,
            file_name: None,
            content_type: Some(content_type.to_string()),
        })
    }
}
