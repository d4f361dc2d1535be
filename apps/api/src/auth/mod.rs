//! Authentication middleware.
//!
//! Verifies the session token, resolves the principal's entitlement once, and
//! attaches a `RequestContext` to the request for the handlers downstream.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::entitlements::{self, Entitlement};
use crate::errors::AppError;
use crate::state::AppState;

pub mod session;

pub use session::{ClerkJwtVerifier, SessionVerifier};

const SESSION_COOKIE: &str = "__session";

/// Request-scoped principal and entitlement snapshot.
/// Extract with `Extension<RequestContext>`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: String,
    pub entitlement: Entitlement,
}

impl RequestContext {
    pub fn is_premium(&self) -> bool {
        self.entitlement.is_premium
    }
}

/// Bearer header first, then the Clerk session cookie.
fn session_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token);
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers()).ok_or(AppError::Unauthorized)?;

    let user_id = state.sessions.verify(token).map_err(|e| {
        warn!("Rejected session token: {e}");
        AppError::Unauthorized
    })?;

    let entitlement = entitlements::resolve(state.identity.as_ref(), &user_id).await?;

    debug!(
        "Auth complete: user_id={}, plan={}, free_usage={}",
        user_id,
        entitlement.plan.as_str(),
        entitlement.free_usage
    );

    request.extensions_mut().insert(RequestContext {
        user_id,
        entitlement,
    });

    Ok(next.run(request).await)
}
