use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client};
use tracing::debug;

use super::{read_binary, ImageGenerator, ProviderError};

const CLIPDROP_TEXT_TO_IMAGE_URL: &str = "https://clipdrop-api.co/text-to-image/v1";

/// ClipDrop text-to-image client.
#[derive(Clone)]
pub struct ClipDropClient {
    client: Client,
    api_key: String,
}

impl ClipDropClient {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
        })
    }
}

#[async_trait]
impl ImageGenerator for ClipDropClient {
    async fn generate(&self, prompt: &str) -> Result<Bytes, ProviderError> {
        let form = multipart::Form::new().text("prompt", prompt.to_string());

        let response = self
            .client
            .post(CLIPDROP_TEXT_TO_IMAGE_URL)
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let bytes = read_binary("ClipDrop", response).await?;
        debug!("ClipDrop returned {} bytes", bytes.len());
        Ok(bytes)
    }
}
