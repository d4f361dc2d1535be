use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use super::{content_key, MediaStore, StorageError, StoredMedia};

/// S3 / MinIO backed media store.
#[derive(Clone)]
pub struct S3MediaStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
    transform_url: String,
}

impl S3MediaStore {
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: String,
        public_url: &str,
        transform_url: &str,
    ) -> Self {
        Self {
            client,
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
            transform_url: transform_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredMedia, StorageError> {
        let key = content_key(&bytes, content_type);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(format!("S3 put_object failed: {e}")))?;

        info!("Uploaded media to s3://{}/{}", self.bucket, key);

        Ok(StoredMedia {
            url: format!("{}/{}", self.public_url, key),
            key,
        })
    }

    fn transformed_url(&self, media: &StoredMedia, transform: &str) -> String {
        format!("{}/{}/{}", self.transform_url, transform, media.key)
    }
}
