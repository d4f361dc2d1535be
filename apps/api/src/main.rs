mod auth;
mod config;
mod creations;
mod db;
mod entitlements;
mod errors;
mod generation;
mod identity;
mod llm_client;
mod models;
mod providers;
mod routes;
mod staging;
mod state;
mod storage;

#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::ClerkJwtVerifier;
use crate::config::Config;
use crate::creations::PgCreationStore;
use crate::db::{create_pool, ensure_schema};
use crate::identity::ClerkClient;
use crate::llm_client::LlmClient;
use crate::providers::{BackgroundRemover, ClipDropClient, RemoveBgClient};
use crate::routes::build_router;
use crate::staging::StagingArea;
use crate::state::AppState;
use crate::storage::S3MediaStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AI Hub API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let media = S3MediaStore::new(
        s3,
        config.s3_bucket.clone(),
        &config.s3_public_url,
        &config.image_transform_url,
    );
    info!("S3 client initialized");

    // Identity provider: session verification + metadata store
    let sessions = ClerkJwtVerifier::from_pem(&config.clerk_jwt_key)?;
    let identity = ClerkClient::new(config.clerk_secret_key.clone())?;
    info!("Clerk identity client initialized");

    // Generation providers
    let llm = LlmClient::new(config.gemini_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let images = ClipDropClient::new(config.clipdrop_api_key.clone())?;
    let background_remover: Option<Arc<dyn BackgroundRemover>> =
        match config.remove_bg_api_key.clone() {
            Some(key) => Some(Arc::new(RemoveBgClient::new(key)?)),
            None => {
                warn!("REMOVE_BG_API_KEY not set; background removal will upload images unchanged");
                None
            }
        };

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    info!("Staging uploads in {}", config.upload_dir.display());

    // Build app state
    let state = AppState {
        sessions: Arc::new(sessions),
        identity: Arc::new(identity),
        creations: Arc::new(PgCreationStore::new(db)),
        media: Arc::new(media),
        text: Arc::new(llm),
        images: Arc::new(images),
        background_remover,
        staging: StagingArea::new(config.upload_dir.clone()),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the frontend host once it is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "aihub-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
