//! Generation mediator. Runs one validated `Operation` end to end.
//!
//! Order, short-circuiting on the first failure:
//! entitlement gate → size limit → provider call → creation insert → metering.
//!
//! Business rejections are `Ok` responses with `success: false`. Upstream
//! failures surface as `AppError` with the operation's generic message. Staged
//! files are owned by the operation and removed whichever way this returns.

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::RequestContext;
use crate::entitlements::charge_if_free;
use crate::errors::AppError;
use crate::generation::extract::extract_resume_text;
use crate::generation::operation::{Gate, Operation};
use crate::llm_client::prompts::{
    resume_review_prompt, BLOG_TITLE_MAX_TOKENS, RESUME_REVIEW_MAX_TOKENS,
};
use crate::models::creation::{CreationType, NewCreation};
use crate::state::AppState;
use crate::storage::object_removal_transform;

pub const FREE_LIMIT_MESSAGE: &str = "Free limit reached. Upgrade to continue.";
pub const PREMIUM_ONLY_MESSAGE: &str = "This feature is only available for premium subscription.";
pub const BACKGROUND_FALLBACK_MESSAGE: &str =
    "Background removal service not configured. Image uploaded normally.";
pub const RESUME_TOO_LARGE_MESSAGE: &str = "Resume file size exceeds 5MB.";

pub const MAX_RESUME_BYTES: u64 = 5 * 1024 * 1024;

/// Uniform result envelope for every generation route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GenerationResponse {
    pub fn ok(content: String) -> Self {
        Self {
            success: true,
            content: Some(content),
            message: None,
        }
    }

    pub fn rejected(message: &str) -> Self {
        Self {
            success: false,
            content: None,
            message: Some(message.to_string()),
        }
    }
}

/// What a successful provider call produced, ready to be recorded.
struct Produced {
    prompt: String,
    content: String,
    creation_type: CreationType,
    publish: bool,
    /// Set when the operation succeeded in a degraded mode.
    note: Option<&'static str>,
}

impl Produced {
    fn new(prompt: String, content: String, creation_type: CreationType) -> Self {
        Self {
            prompt,
            content,
            creation_type,
            publish: false,
            note: None,
        }
    }
}

pub async fn mediate(
    state: &AppState,
    ctx: &RequestContext,
    operation: Operation,
) -> Result<GenerationResponse, AppError> {
    let failure_message = operation.failure_message();
    let name = operation.name();
    run(state, ctx, operation).await.map_err(|e| {
        warn!("{name} failed for {}: {e}", ctx.user_id);
        e.with_public_message(failure_message)
    })
}

async fn run(
    state: &AppState,
    ctx: &RequestContext,
    operation: Operation,
) -> Result<GenerationResponse, AppError> {
    let gate = operation.gate();

    match gate {
        Gate::FreeQuota if ctx.entitlement.quota_exhausted() => {
            info!("{} rejected for {}: free limit reached", operation.name(), ctx.user_id);
            return Ok(GenerationResponse::rejected(FREE_LIMIT_MESSAGE));
        }
        Gate::PremiumOnly if !ctx.is_premium() => {
            info!("{} rejected for {}: not premium", operation.name(), ctx.user_id);
            return Ok(GenerationResponse::rejected(PREMIUM_ONLY_MESSAGE));
        }
        _ => {}
    }

    if let Operation::ResumeReview { resume } = &operation {
        if resume.size() > MAX_RESUME_BYTES {
            return Err(AppError::InvalidInput(RESUME_TOO_LARGE_MESSAGE.to_string()));
        }
    }

    let produced = invoke(state, operation).await?;

    // A creation that cannot be recorded is a failed request.
    let creation = state
        .creations
        .insert(NewCreation {
            user_id: ctx.user_id.clone(),
            prompt: produced.prompt,
            content: produced.content.clone(),
            creation_type: produced.creation_type,
            publish: produced.publish,
        })
        .await?;

    if gate == Gate::FreeQuota {
        // The creation is already stored; a metering miss is logged, not surfaced.
        if let Err(e) = charge_if_free(state.identity.as_ref(), &ctx.user_id, ctx.is_premium()).await {
            warn!("Failed to record free usage for {} (creation {}): {e}", ctx.user_id, creation.id);
        }
    }

    let mut response = GenerationResponse::ok(produced.content);
    response.message = produced.note.map(str::to_string);
    Ok(response)
}

async fn invoke(state: &AppState, operation: Operation) -> Result<Produced, AppError> {
    match operation {
        Operation::Article { prompt, length } => {
            let content = state.text.complete(&prompt, length).await?;
            Ok(Produced::new(prompt, content, CreationType::Article))
        }

        Operation::BlogTitle { prompt } => {
            let content = state.text.complete(&prompt, BLOG_TITLE_MAX_TOKENS).await?;
            Ok(Produced::new(prompt, content, CreationType::BlogTitle))
        }

        Operation::Image { prompt, publish } => {
            let png = state.images.generate(&prompt).await?;
            let stored = state.media.upload(png.to_vec(), "image/png").await?;
            Ok(Produced {
                publish,
                ..Produced::new(prompt, stored.url, CreationType::Image)
            })
        }

        Operation::RemoveBackground { image } => {
            let bytes = image.read().await?;
            let prompt = "Remove background from image".to_string();

            let Some(remover) = state.background_remover.as_ref() else {
                let stored = state.media.upload(bytes, image.content_type()).await?;
                image.discard();
                return Ok(Produced {
                    note: Some(BACKGROUND_FALLBACK_MESSAGE),
                    ..Produced::new(prompt, stored.url, CreationType::Image)
                });
            };

            let transformed = remover.remove_background(bytes, image.file_name()).await?;
            let output = state
                .staging
                .stage_bytes(&transformed, "_nobg.png", "image/png")
                .await?;
            let stored = state.media.upload(output.read().await?, "image/png").await?;
            image.discard();
            output.discard();
            Ok(Produced::new(prompt, stored.url, CreationType::Image))
        }

        Operation::RemoveObject { image, object } => {
            let bytes = image.read().await?;
            let stored = state.media.upload(bytes, image.content_type()).await?;
            image.discard();
            let url = state
                .media
                .transformed_url(&stored, &object_removal_transform(&object));
            Ok(Produced::new(
                format!("Remove {object} from image"),
                url,
                CreationType::Image,
            ))
        }

        Operation::ResumeReview { resume } => {
            let bytes = resume.read().await?;
            resume.discard();
            let text = extract_resume_text(bytes).await?;
            let content = state
                .text
                .complete(&resume_review_prompt(&text), RESUME_REVIEW_MAX_TOKENS)
                .await?;
            Ok(Produced::new(
                "Resume review".to_string(),
                content,
                CreationType::ResumeReview,
            ))
        }
    }
}
