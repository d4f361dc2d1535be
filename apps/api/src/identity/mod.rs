//! Principal metadata store: the identity provider's per-user key/value bag.
//!
//! Plan and free-usage state live here, not in Postgres. Access is plain
//! read-modify-write with no transactional guarantee.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod clerk;

pub use clerk::ClerkClient;

/// A principal's private metadata bag.
pub type Metadata = Map<String, Value>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unknown principal {0}")]
    UnknownPrincipal(String),
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Returns the full metadata bag for a principal (empty if never written).
    async fn get_metadata(&self, principal_id: &str) -> Result<Metadata, IdentityError>;

    /// Merges `update` into the principal's metadata. Keys absent from
    /// `update` are left as they were.
    async fn set_metadata(&self, principal_id: &str, update: Metadata)
        -> Result<(), IdentityError>;
}
