//! Supabase Storage client for catalog images.
//!
//! Implements [`ObjectStorage`] against the Storage REST API using the
//! project's service-role key.
//!
//! # API Reference
//!
//! - Upload: `POST {project}/storage/v1/object/{bucket}/{path}`
//! - Remove: `DELETE {project}/storage/v1/object/{bucket}` with `{"prefixes": [...]}`
//! - Public URL: `{project}/storage/v1/object/public/{bucket}/{path}`

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::{SupabaseConfig, bearer};
use crate::models::ImageUpload;
use crate::ports::{ObjectStorage, StorageError};

/// Cache lifetime requested for uploaded objects, in seconds.
const CACHE_CONTROL: &str = "3600";

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

/// Supabase Storage API client.
#[derive(Clone)]
pub struct SupabaseStorage {
    inner: Arc<SupabaseStorageInner>,
}

struct SupabaseStorageInner {
    client: reqwest::Client,
    base_url: String,
}

impl SupabaseStorage {
    /// Create a new storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();

        let auth_value = HeaderValue::from_str(&bearer(&config.service_role_key))
            .map_err(|e| StorageError::Http(format!("Invalid service key format: {e}")))?;
        headers.insert(AUTHORIZATION, auth_value);

        headers.insert(
            "apikey",
            HeaderValue::from_str(config.service_role_key.expose_secret())
                .map_err(|e| StorageError::Http(format!("Invalid service key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseStorageInner {
                client,
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.inner.base_url)
    }

    /// Turn a non-success response into a [`StorageError`].
    async fn parse_error(response: reqwest::Response) -> StorageError {
        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return StorageError::Unauthorized;
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        StorageError::Api { status, message }
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    #[instrument(skip(self, file), fields(size = file.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        file: &ImageUpload,
    ) -> Result<String, StorageError> {
        let response = self
            .inner
            .client
            .post(self.object_url(bucket, path))
            .header(CONTENT_TYPE, &file.content_type)
            .header("cache-control", format!("max-age={CACHE_CONTROL}"))
            .header("x-upsert", "false")
            .body(file.bytes.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        debug!("Uploaded object");
        Ok(self.public_url(bucket, path))
    }

    #[instrument(skip(self, paths), fields(count = paths.len()))]
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError> {
        if paths.is_empty() {
            return Ok(());
        }

        let response = self
            .inner
            .client
            .delete(format!("{}/storage/v1/object/{bucket}", self.inner.base_url))
            .json(&RemoveRequest { prefixes: paths })
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(Self::parse_error(response).await)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.inner.base_url
        )
    }
}

impl std::fmt::Debug for SupabaseStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStorage")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}
