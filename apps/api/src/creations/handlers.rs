use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::creations::toggle_like;
use crate::entitlements::{self, Plan};
use crate::errors::AppError;
use crate::models::creation::CreationRow;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreationListResponse {
    pub success: bool,
    pub creations: Vec<CreationRow>,
}

#[derive(Deserialize)]
pub struct ToggleLikeRequest {
    pub id: String,
}

#[derive(Serialize)]
pub struct ToggleLikeResponse {
    pub success: bool,
    pub message: &'static str,
    pub likes: Vec<String>,
}

#[derive(Serialize)]
pub struct UsageResponse {
    pub success: bool,
    pub plan: Plan,
    pub free_usage: i64,
    /// `null` for premium principals.
    pub remaining: Option<i64>,
}

/// GET /api/user/get-user-creations
pub async fn handle_get_user_creations(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<CreationListResponse>, AppError> {
    let creations = state.creations.list_by_user(&ctx.user_id).await?;
    Ok(Json(CreationListResponse {
        success: true,
        creations,
    }))
}

/// GET /api/user/get-published-creations
pub async fn handle_get_published_creations(
    State(state): State<AppState>,
) -> Result<Json<CreationListResponse>, AppError> {
    let creations = state.creations.list_published().await?;
    Ok(Json(CreationListResponse {
        success: true,
        creations,
    }))
}

/// POST /api/user/toggle-like-creation
pub async fn handle_toggle_like(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<ToggleLikeRequest>, JsonRejection>,
) -> Result<Json<ToggleLikeResponse>, AppError> {
    let Json(request) = payload
        .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e.body_text())))?;
    // An id that cannot exist is reported the same way as one that does not.
    let id = Uuid::parse_str(request.id.trim())
        .map_err(|_| AppError::NotFound("Creation not found".to_string()))?;

    let toggle = toggle_like(state.creations.as_ref(), id, &ctx.user_id).await?;

    Ok(Json(ToggleLikeResponse {
        success: true,
        message: toggle.message(),
        likes: toggle.likes,
    }))
}

/// GET /api/user/usage
///
/// Display path: re-reads the identity store without gating anything.
pub async fn handle_get_usage(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Json<UsageResponse> {
    let entitlement = entitlements::peek(state.identity.as_ref(), &ctx.user_id).await;
    Json(UsageResponse {
        success: true,
        plan: if entitlement.is_premium {
            Plan::Premium
        } else {
            entitlement.plan
        },
        free_usage: entitlement.free_usage,
        remaining: entitlement.remaining(),
    })
}
