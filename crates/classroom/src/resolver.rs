//! Material resolver: material id to signed file reference.

use crate::material::SignedFileReference;
use crate::storage::ObjectStorage;
use crate::store::MaterialStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Resolution failures.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("material not found: {0}")]
    NotFound(String),

    #[error("failed to resolve material file: {0}")]
    ResolutionFailed(String),
}

/// Produces signed references to material files.
///
/// Every reference is signed with the same validity window.
#[derive(Clone)]
pub struct MaterialResolver {
    store: Arc<dyn MaterialStore>,
    storage: Arc<dyn ObjectStorage>,
    ttl: Duration,
}

impl MaterialResolver {
    pub fn new(store: Arc<dyn MaterialStore>, storage: Arc<dyn ObjectStorage>, ttl: Duration) -> Self {
        Self { store, storage, ttl }
    }

    /// Resolve a material to a fresh signed reference.
    pub async fn resolve(&self, material_id: &str) -> Result<SignedFileReference, ResolveError> {
        let listing = self
            .store
            .get(material_id)
            .map_err(|e| ResolveError::ResolutionFailed(e.to_string()))?
            .ok_or_else(|| ResolveError::NotFound(material_id.to_string()))?;

        let stored_file = listing.material.stored_file.ok_or_else(|| {
            ResolveError::ResolutionFailed(format!("material {} has no stored file", material_id))
        })?;

        let path = stored_file.object_path(self.storage.bucket()).ok_or_else(|| {
            ResolveError::ResolutionFailed(format!(
                "cannot derive object path for material {}",
                material_id
            ))
        })?;

        let reference = self
            .storage
            .sign_url(&path, self.ttl)
            .await
            .map_err(|e| ResolveError::ResolutionFailed(e.to_string()))?;

        tracing::debug!(
            "Resolved material {} to {} (expires {})",
            material_id,
            path,
            reference.expires_at
        );
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Material, MaterialListing, StoredFile};
    use async_trait::async_trait;
    use chrono::Utc;
    use lectern_core::{AppError, AppResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<String, Material>>,
        fail: bool,
    }

    impl MemoryStore {
        fn with(material: Material) -> Self {
            let store = Self::default();
            store.rows.lock().unwrap().insert(material.id.clone(), material);
            store
        }
    }

    impl MaterialStore for MemoryStore {
        fn insert(&self, material: &Material) -> AppResult<()> {
            self.rows.lock().unwrap().insert(material.id.clone(), material.clone());
            Ok(())
        }

        fn get(&self, id: &str) -> AppResult<Option<MaterialListing>> {
            if self.fail {
                return Err(AppError::Database("connection lost".to_string()));
            }
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .map(|m| MaterialListing::new(m, None)))
        }

        fn list(&self, _teacher_id: Option<&str>) -> AppResult<Vec<MaterialListing>> {
            Ok(Vec::new())
        }

        fn delete(&self, id: &str) -> AppResult<bool> {
            Ok(self.rows.lock().unwrap().remove(id).is_some())
        }
    }

    #[derive(Default)]
    struct CountingStorage {
        sign_calls: AtomicUsize,
        signed_paths: Mutex<Vec<(String, Duration)>>,
        deny: bool,
    }

    #[async_trait]
    impl ObjectStorage for CountingStorage {
        fn bucket(&self) -> &str {
            "materials"
        }

        async fn upload(&self, _path: &str, _bytes: &[u8], _content_type: &str) -> AppResult<()> {
            Ok(())
        }

        async fn delete(&self, _path: &str) -> AppResult<()> {
            Ok(())
        }

        async fn sign_url(&self, path: &str, ttl: Duration) -> AppResult<SignedFileReference> {
            self.sign_calls.fetch_add(1, Ordering::SeqCst);
            if self.deny {
                return Err(AppError::Storage("signing denied".to_string()));
            }
            self.signed_paths.lock().unwrap().push((path.to_string(), ttl));
            Ok(SignedFileReference {
                url: format!("https://files.test/{}?sig=1", path),
                expires_at: Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64),
            })
        }

        async fn read(&self, _path: &str) -> AppResult<Option<Vec<u8>>> {
            Ok(None)
        }
    }

    fn material(stored_file: Option<StoredFile>) -> Material {
        Material {
            id: "m1".to_string(),
            subject_name: "Physics 101".to_string(),
            description: "Mechanics".to_string(),
            teacher_id: "t1".to_string(),
            stored_file,
            created_at: Utc::now(),
        }
    }

    fn resolver(store: MemoryStore, storage: Arc<CountingStorage>) -> MaterialResolver {
        MaterialResolver::new(Arc::new(store), storage, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_missing_material_never_signs() {
        let storage = Arc::new(CountingStorage::default());
        let resolver = resolver(MemoryStore::default(), storage.clone());

        let result = resolver.resolve("missing").await;
        assert!(matches!(result, Err(ResolveError::NotFound(_))));
        assert_eq!(storage.sign_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_direct_path_uses_configured_ttl() {
        let storage = Arc::new(CountingStorage::default());
        let resolver = resolver(
            MemoryStore::with(material(Some(StoredFile::DirectPath(
                "public/t1/1.pdf".to_string(),
            )))),
            storage.clone(),
        );

        let reference = resolver.resolve("m1").await.unwrap();
        assert!(reference.expires_at > Utc::now());
        assert_eq!(
            storage.signed_paths.lock().unwrap().as_slice(),
            &[("public/t1/1.pdf".to_string(), Duration::from_secs(3600))]
        );
    }

    #[tokio::test]
    async fn test_legacy_url_is_converted() {
        let storage = Arc::new(CountingStorage::default());
        let resolver = resolver(
            MemoryStore::with(material(Some(StoredFile::LegacyUrl(
                "https://x.supabase.co/storage/v1/object/public/materials/public/t1/2.docx"
                    .to_string(),
            )))),
            storage.clone(),
        );

        resolver.resolve("m1").await.unwrap();
        assert_eq!(storage.signed_paths.lock().unwrap()[0].0, "public/t1/2.docx");
    }

    #[tokio::test]
    async fn test_legacy_url_escapes_are_signed_once() {
        let storage = Arc::new(CountingStorage::default());
        let resolver = resolver(
            MemoryStore::with(material(Some(StoredFile::LegacyUrl(
                "https://x.supabase.co/storage/v1/object/public/materials/public/t1/week%201.pdf"
                    .to_string(),
            )))),
            storage.clone(),
        );

        resolver.resolve("m1").await.unwrap();
        assert_eq!(storage.signed_paths.lock().unwrap()[0].0, "public/t1/week 1.pdf");
    }

    #[tokio::test]
    async fn test_underivable_path_is_resolution_failure() {
        let storage = Arc::new(CountingStorage::default());
        let resolver = resolver(
            MemoryStore::with(material(Some(StoredFile::LegacyUrl(
                "https://cdn.test/other/2.docx".to_string(),
            )))),
            storage.clone(),
        );
        assert!(matches!(
            resolver.resolve("m1").await,
            Err(ResolveError::ResolutionFailed(_))
        ));

        let resolver = resolver_without_file(storage.clone());
        assert!(matches!(
            resolver.resolve("m1").await,
            Err(ResolveError::ResolutionFailed(_))
        ));
        assert_eq!(storage.sign_calls.load(Ordering::SeqCst), 0);
    }

    fn resolver_without_file(storage: Arc<CountingStorage>) -> MaterialResolver {
        resolver(MemoryStore::with(material(None)), storage)
    }

    #[tokio::test]
    async fn test_signing_denied_is_resolution_failure() {
        let storage = Arc::new(CountingStorage {
            deny: true,
            ..Default::default()
        });
        let resolver = resolver(
            MemoryStore::with(material(Some(StoredFile::DirectPath("a.pdf".to_string())))),
            storage,
        );
        assert!(matches!(
            resolver.resolve("m1").await,
            Err(ResolveError::ResolutionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_not_found() {
        let storage = Arc::new(CountingStorage::default());
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        let resolver = resolver(store, storage);
        assert!(matches!(
            resolver.resolve("m1").await,
            Err(ResolveError::ResolutionFailed(_))
        ));
    }
}
