//! Filesystem-backed object storage.

use super::{validate_object_path, ObjectStorage, UrlSigner};
use crate::material::SignedFileReference;
use async_trait::async_trait;
use chrono::Utc;
use lectern_core::{AppError, AppResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Stores objects under `<root>/<bucket>/<path>`.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    bucket: String,
    bucket_dir: PathBuf,
    signer: UrlSigner,
}

impl LocalObjectStorage {
    pub fn new(root: &Path, bucket: impl Into<String>, signer: UrlSigner) -> Self {
        let bucket = bucket.into();
        let bucket_dir = root.join(&bucket);
        Self {
            bucket,
            bucket_dir,
            signer,
        }
    }

    /// The signer used for this bucket's URLs.
    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    fn object_file(&self, path: &str) -> AppResult<PathBuf> {
        validate_object_path(path)?;
        Ok(self.bucket_dir.join(path))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> AppResult<()> {
        let file = self.object_file(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Storage(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }

        let mut handle = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    AppError::Storage(format!("Object already exists: {}", path))
                }
                _ => AppError::Storage(format!("Failed to create object {}: {}", path, e)),
            })?;
        handle
            .write_all(bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write object {}: {}", path, e)))?;
        handle
            .flush()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write object {}: {}", path, e)))?;

        tracing::info!(
            "Stored object {}/{} ({} bytes, {})",
            self.bucket,
            path,
            bytes.len(),
            content_type
        );
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let file = self.object_file(path)?;
        tokio::fs::remove_file(&file).await.map_err(|e| {
            AppError::Storage(format!("Failed to delete object {}: {}", path, e))
        })?;

        tracing::info!("Deleted object {}/{}", self.bucket, path);
        Ok(())
    }

    async fn sign_url(&self, path: &str, ttl: Duration) -> AppResult<SignedFileReference> {
        let file = self.object_file(path)?;
        if !tokio::fs::try_exists(&file).await.unwrap_or(false) {
            return Err(AppError::Storage(format!("Object not found: {}", path)));
        }

        let reference = self.signer.sign(&self.bucket, path, ttl, Utc::now())?;
        tracing::debug!(
            "Signed {}/{} until {}",
            self.bucket,
            path,
            reference.expires_at
        );
        Ok(reference)
    }

    async fn read(&self, path: &str) -> AppResult<Option<Vec<u8>>> {
        let file = self.object_file(path)?;
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read object {}: {}",
                path, e
            ))),
        }
    }
}
