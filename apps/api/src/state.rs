use std::sync::Arc;

use crate::auth::SessionVerifier;
use crate::creations::CreationStore;
use crate::identity::MetadataStore;
use crate::llm_client::TextGenerator;
use crate::providers::{BackgroundRemover, ImageGenerator};
use crate::staging::StagingArea;
use crate::storage::MediaStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every external collaborator sits behind a trait object so handlers carry no
/// in-process mutable state of their own.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionVerifier>,
    /// Identity provider metadata; system of record for plan and free usage.
    pub identity: Arc<dyn MetadataStore>,
    pub creations: Arc<dyn CreationStore>,
    pub media: Arc<dyn MediaStore>,
    pub text: Arc<dyn TextGenerator>,
    pub images: Arc<dyn ImageGenerator>,
    /// `None` when no background-removal credential is configured.
    pub background_remover: Option<Arc<dyn BackgroundRemover>>,
    pub staging: StagingArea,
}
