//! Object storage port for product and category images.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ImageUpload;

/// Errors reported by an object storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The request never got a response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The storage API rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The service credentials were refused.
    #[error("Unauthorized: storage credentials rejected")]
    Unauthorized,
}

/// Bucketed object storage with public URLs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `file` at `path` in `bucket` and return its public URL.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        file: &ImageUpload,
    ) -> Result<String, StorageError>;

    /// Remove objects by path.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError>;

    /// Public URL of an object.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Object path of a public URL in `bucket`, if the URL points into it.
///
/// Public URLs look like `{base}/storage/v1/object/public/{bucket}/{path}`.
#[must_use]
pub fn object_path_from_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/object/public/{bucket}/");
    let start = url.find(&marker)? + marker.len();
    let path = url.get(start..)?;
    let path = path.split(['?', '#']).next().unwrap_or(path);
    (!path.is_empty()).then(|| path.to_string())
}
