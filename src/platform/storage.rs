use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::error::{StoreError, StoreResult};
use crate::platform::client::encode_key;
use crate::platform::PlatformClient;
use crate::storage::{ObjectStore, PutOptions};

/// One bucket of the platform's object storage, acting for a signed-in user
pub struct PlatformStorage {
    client: PlatformClient,
    bucket: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl PlatformStorage {
    pub fn new(client: PlatformClient, bucket: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            access_token: access_token.into(),
        }
    }

    fn object_path(&self, key: &str) -> String {
        format!("/storage/v1/object/{}/{}", self.bucket, encode_key(key))
    }
}

#[async_trait]
impl ObjectStore for PlatformStorage {
    async fn put(&self, key: &str, data: Bytes, options: &PutOptions) -> StoreResult<()> {
        let content_type = options.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(key)
                .first_or_octet_stream()
                .to_string()
        });

        let request = self
            .client
            .request(Method::POST, &self.object_path(key), Some(&self.access_token))
            .header(CACHE_CONTROL, format!("max-age={}", options.cache_control))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", options.overwrite.to_string())
            .body(data);

        self.client.send(request).await?;
        tracing::debug!("Stored object {} in bucket {}", key, self.bucket);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let path = format!(
            "/storage/v1/object/authenticated/{}/{}",
            self.bucket,
            encode_key(key)
        );
        let request = self
            .client
            .request(Method::GET, &path, Some(&self.access_token));

        let response = self.client.send(request).await?;
        Ok(response.bytes().await?)
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<()> {
        let path = format!("/storage/v1/object/{}", self.bucket);
        let request = self
            .client
            .request(Method::DELETE, &path, Some(&self.access_token))
            .json(&json!({ "prefixes": keys }));

        self.client.send(request).await?;
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> StoreResult<Option<String>> {
        let path = format!("/storage/v1/object/sign/{}/{}", self.bucket, encode_key(key));
        let request = self
            .client
            .request(Method::POST, &path, Some(&self.access_token))
            .json(&json!({ "expiresIn": ttl.as_secs() }));

        let signed: SignedUrlResponse = self.client.send_json(request).await?;
        if signed.signed_url.is_empty() {
            return Err(StoreError::Decode("empty signed URL".to_string()));
        }

        // The platform answers with a path relative to the storage API
        Ok(Some(format!(
            "{}/storage/v1{}",
            self.client.base_url(),
            signed.signed_url
        )))
    }

    fn storage_type(&self) -> &'static str {
        "platform"
    }
}
