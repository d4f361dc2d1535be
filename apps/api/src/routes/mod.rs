pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::require_auth;
use crate::creations::handlers as creations;
use crate::generation::handlers as generation;
use crate::staging::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Headroom for multipart boundaries and text fields around the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let ai = Router::new()
        .route("/generate-article", post(generation::handle_generate_article))
        .route(
            "/generate-blog-title",
            post(generation::handle_generate_blog_title),
        )
        .route("/generate-image", post(generation::handle_generate_image))
        .route(
            "/remove-image-background",
            post(generation::handle_remove_background),
        )
        .route(
            "/remove-image-object",
            post(generation::handle_remove_object),
        )
        .route("/resume-review", post(generation::handle_resume_review));

    let user = Router::new()
        .route(
            "/get-user-creations",
            get(creations::handle_get_user_creations),
        )
        .route(
            "/get-published-creations",
            get(creations::handle_get_published_creations),
        )
        .route(
            "/toggle-like-creation",
            post(creations::handle_toggle_like),
        )
        .route("/usage", get(creations::handle_get_usage));

    let authenticated = Router::new()
        .nest("/api/ai", ai)
        .nest("/api/user", user)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(authenticated)
        .layer(DefaultBodyLimit::max(
            MAX_UPLOAD_BYTES as usize + MULTIPART_OVERHEAD_BYTES,
        ))
        .with_state(state)
}
