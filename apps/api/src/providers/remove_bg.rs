use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client};
use tracing::debug;

use super::{read_binary, BackgroundRemover, ProviderError};

const REMOVE_BG_URL: &str = "https://api.remove.bg/v1.0/removebg";

/// remove.bg client.
#[derive(Clone)]
pub struct RemoveBgClient {
    client: Client,
    api_key: String,
}

impl RemoveBgClient {
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
impl BackgroundRemover for RemoveBgClient {
    async fn remove_background(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<Bytes, ProviderError> {
        let part = multipart::Part::bytes(image).file_name(file_name.to_string());
        let form = multipart::Form::new()
            .part("image_file", part)
            .text("size", "auto");

        let response = self
            .client
            .post(REMOVE_BG_URL)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let bytes = read_binary("remove.bg", response).await?;
        debug!("remove.bg returned {} bytes", bytes.len());
        Ok(bytes)
    }
}
