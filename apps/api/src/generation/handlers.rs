//! Axum route handlers for the generation API.
//!
//! Handlers only decode the request into an `Operation`; everything after
//! validation happens in `mediator::mediate`.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    Extension, Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::auth::RequestContext;
use crate::errors::AppError;
use crate::generation::mediator::{mediate, GenerationResponse};
use crate::generation::operation::Operation;
use crate::staging::{StagedUpload, UploadKind};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ArticleRequest {
    pub prompt: Option<String>,
    /// Number or numeric string.
    pub length: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct BlogTitleRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: Option<String>,
    pub publish: Option<bool>,
}

/// Decoded multipart form: at most one staged file plus the `object` text field.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<StagedUpload>,
    object: Option<String>,
}

fn json_body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e.body_text())))
}

/// Stages the `kind` file field and collects `object`. Any file staged before a
/// later error is dropped with the partial form, removing it from disk.
async fn read_upload_form(
    state: &AppState,
    kind: UploadKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadForm, AppError> {
    let mut multipart =
        multipart.map_err(|e| AppError::InvalidInput(format!("Invalid multipart request: {}", e.body_text())))?;
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart payload: {e}")))?
    {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some(name) if name == kind.field_name() && form.file.is_none() => {
                form.file = Some(state.staging.stage_field(kind, field).await?);
            }
            Some("object") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Invalid multipart payload: {e}")))?;
                form.object = Some(text);
            }
            _ => {} // ignore unknown fields
        }
    }

    Ok(form)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/generate-article
pub async fn handle_generate_article(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<ArticleRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let request = json_body(payload)?;
    let operation = Operation::article(request.prompt, request.length.as_ref())?;
    Ok(Json(mediate(&state, &ctx, operation).await?))
}

/// POST /api/ai/generate-blog-title
pub async fn handle_generate_blog_title(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<BlogTitleRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let request = json_body(payload)?;
    let operation = Operation::blog_title(request.prompt)?;
    Ok(Json(mediate(&state, &ctx, operation).await?))
}

/// POST /api/ai/generate-image
pub async fn handle_generate_image(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let request = json_body(payload)?;
    let operation = Operation::image(request.prompt, request.publish)?;
    Ok(Json(mediate(&state, &ctx, operation).await?))
}

/// POST /api/ai/remove-image-background: multipart `image`
pub async fn handle_remove_background(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let form = read_upload_form(&state, UploadKind::Image, multipart).await?;
    let operation = Operation::remove_background(form.file)?;
    Ok(Json(mediate(&state, &ctx, operation).await?))
}

/// POST /api/ai/remove-image-object: multipart `image` + `object`
pub async fn handle_remove_object(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let form = read_upload_form(&state, UploadKind::Image, multipart).await?;
    let operation = Operation::remove_object(form.file, form.object)?;
    Ok(Json(mediate(&state, &ctx, operation).await?))
}

/// POST /api/ai/resume-review: multipart `resume`
pub async fn handle_resume_review(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, AppError> {
    let form = read_upload_form(&state, UploadKind::Resume, multipart).await?;
    let operation = Operation::resume_review(form.file)?;
    Ok(Json(mediate(&state, &ctx, operation).await?))
}
