use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{IdentityError, Metadata, MetadataStore};

const CLERK_API_URL: &str = "https://api.clerk.com/v1";

#[derive(Debug, Deserialize)]
struct ClerkUser {
    #[serde(default)]
    private_metadata: Metadata,
}

#[derive(Debug, Serialize)]
struct MetadataPatch<'a> {
    private_metadata: &'a Metadata,
}

#[derive(Debug, Deserialize)]
struct ClerkErrors {
    errors: Vec<ClerkErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ClerkErrorBody {
    message: String,
}

/// Clerk Backend API client, used as the system of record for plan/usage.
#[derive(Clone)]
pub struct ClerkClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl ClerkClient {
    pub fn new(secret_key: String) -> Result<Self, IdentityError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()?,
            secret_key,
            base_url: CLERK_API_URL.to_string(),
        })
    }

    async fn check(
        principal_id: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.as_u16() == 404 {
            return Err(IdentityError::UnknownPrincipal(principal_id.to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ClerkErrors>(&body)
            .ok()
            .and_then(|e| e.errors.into_iter().next())
            .map(|e| e.message)
            .unwrap_or(body);
        Err(IdentityError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl MetadataStore for ClerkClient {
    async fn get_metadata(&self, principal_id: &str) -> Result<Metadata, IdentityError> {
        let response = self
            .client
            .get(format!("{}/users/{}", self.base_url, principal_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        let user: ClerkUser = Self::check(principal_id, response).await?.json().await?;
        debug!(
            "Fetched metadata for {principal_id}: {} keys",
            user.private_metadata.len()
        );
        Ok(user.private_metadata)
    }

    async fn set_metadata(
        &self,
        principal_id: &str,
        update: Metadata,
    ) -> Result<(), IdentityError> {
        // Clerk deep-merges private_metadata on this endpoint.
        let response = self
            .client
            .patch(format!("{}/users/{}/metadata", self.base_url, principal_id))
            .bearer_auth(&self.secret_key)
            .json(&MetadataPatch {
                private_metadata: &update,
            })
            .send()
            .await?;
        Self::check(principal_id, response).await?;
        debug!("Updated metadata for {principal_id}");
        Ok(())
    }
}
