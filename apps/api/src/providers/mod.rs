//! Binary-output generation providers (image synthesis, background removal).
//!
//! Text completion lives in `llm_client`; everything here returns image bytes.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod clipdrop;
pub mod remove_bg;

pub use clipdrop::ClipDropClient;
pub use remove_bg::RemoveBgClient;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{0} returned an empty payload")]
    EmptyPayload(&'static str),
}

/// Text-to-image provider.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns encoded PNG bytes for the prompt.
    async fn generate(&self, prompt: &str) -> Result<Bytes, ProviderError>;
}

/// Background-removal provider. Optional in `AppState`.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Returns a PNG of `image` with the background made transparent.
    async fn remove_background(&self, image: Vec<u8>, file_name: &str)
        -> Result<Bytes, ProviderError>;
}

/// Shared response check for the binary endpoints.
pub(crate) async fn read_binary(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<Bytes, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            message,
        });
    }
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(ProviderError::EmptyPayload(provider));
    }
    Ok(bytes)
}
