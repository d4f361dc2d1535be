//! Object storage sink for generated and uploaded media.
//!
//! Keys are content-addressed (`ai-hub-images/<sha256>.<ext>`), so re-uploading
//! identical bytes lands on the same object and the same durable URL.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub mod s3;

pub use s3::S3MediaStore;

pub const MEDIA_FOLDER: &str = "ai-hub-images";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    Upload(String),
}

/// A stored object and the URL it is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredMedia, StorageError>;

    /// Delivery URL for `media` with a named transform applied by the CDN.
    fn transformed_url(&self, media: &StoredMedia, transform: &str) -> String;
}

pub fn content_key(bytes: &[u8], content_type: &str) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    format!("{MEDIA_FOLDER}/{digest}.{}", extension_for(content_type))
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Generative-remove transform for the named object. The name is
/// percent-encoded so it survives as a single URL path segment.
pub fn object_removal_transform(object: &str) -> String {
    format!(
        "e_gen_remove:prompt_{}",
        urlencoding::encode(&object.trim().to_lowercase())
    )
}
