use crate::errors::AppError;

/// Extracts plain text from an uploaded PDF resume.
///
/// PDF parsing is CPU-bound, so it runs on the blocking pool.
pub async fn extract_resume_text(bytes: Vec<u8>) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| {
            // The parser panics on some malformed documents.
            if e.is_panic() {
                AppError::InvalidInput("Resume could not be read as a PDF".to_string())
            } else {
                AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF extraction: {e}"))
            }
        })?
        .map_err(|e| AppError::InvalidInput(format!("Resume could not be read as a PDF: {e}")))?;

    if text.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "No text could be extracted from the resume".to_string(),
        ));
    }
    Ok(text)
}
