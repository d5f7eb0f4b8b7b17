//! Object storage for uploaded material files.

pub mod local;
pub mod signing;

pub use local::LocalObjectStorage;
pub use signing::{SignatureError, SignedLocation, UrlSigner};

use crate::material::SignedFileReference;
use async_trait::async_trait;
use lectern_core::{AppError, AppResult};
use std::time::Duration;

/// A bucket of stored objects addressed by relative path.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Bucket name, used to derive object paths from legacy URLs.
    fn bucket(&self) -> &str;

    /// Store `bytes` at `path`, failing if an object already exists there.
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> AppResult<()>;

    /// Remove the object at `path`.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Produce a URL granting read access to `path` for `ttl`.
    async fn sign_url(&self, path: &str, ttl: Duration) -> AppResult<SignedFileReference>;

    /// Read an object. Returns `None` if it does not exist.
    async fn read(&self, path: &str) -> AppResult<Option<Vec<u8>>>;
}

/// Reject object paths that could escape the bucket.
pub fn validate_object_path(path: &str) -> AppResult<()> {
    if path.is_empty() {
        return Err(AppError::Storage("Object path cannot be empty".to_string()));
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(AppError::Storage(format!(
            "Object path must be relative: {}",
            path
        )));
    }
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(AppError::Storage(format!("Invalid object path: {}", path)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_nested_paths() {
        assert!(validate_object_path("public/t1/1700000000000.pdf").is_ok());
        assert!(validate_object_path("a.pdf").is_ok());
    }

    #[test]
    fn test_rejects_escaping_paths() {
        for path in ["", "/etc/passwd", "../a.pdf", "public/../../a", "a//b", "a/", "./a", "a\\b"] {
            assert!(validate_object_path(path).is_err(), "accepted {:?}", path);
        }
    }
}
