//! Material catalog: teacher uploads, dashboards and deletion.

use crate::identity::{IdentityError, RequestContext};
use crate::material::{file_extension, mime_for_extension, Material, MaterialListing, NewMaterial, StoredFile};
use crate::storage::ObjectStorage;
use crate::store::MaterialStore;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Catalog failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("material {0} belongs to another teacher")]
    NotOwner(String),

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("material not found: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("metadata store failure: {0}")]
    Store(String),
}

/// Result of a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub material_id: String,
    /// Set when the row was removed but the stored file could not be
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_warning: Option<String>,
}

/// Material metadata plus the files behind it.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn MaterialStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl Catalog {
    pub fn new(store: Arc<dyn MaterialStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { store, storage }
    }

    /// Store a teacher's file and record the material.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        upload: NewMaterial,
    ) -> Result<Material, CatalogError> {
        let teacher = ctx.require_teacher()?;

        let subject_name = upload.subject_name.trim();
        let description = upload.description.trim();
        if subject_name.is_empty() {
            return Err(CatalogError::InvalidUpload("subject name is required".to_string()));
        }
        if description.is_empty() {
            return Err(CatalogError::InvalidUpload("description is required".to_string()));
        }
        if upload.bytes.is_empty() {
            return Err(CatalogError::InvalidUpload("file is required".to_string()));
        }
        let ext = file_extension(upload.file_name.trim()).ok_or_else(|| {
            CatalogError::InvalidUpload(format!("file has no extension: {}", upload.file_name))
        })?;

        let id = uuid::Uuid::new_v4();
        let created_at = Utc::now();
        // Millisecond prefix keeps listings ordered; the id keeps paths unique.
        let path = format!(
            "public/{}/{}-{}.{}",
            teacher.user_id,
            created_at.timestamp_millis(),
            id.simple(),
            ext
        );

        self.storage
            .upload(&path, &upload.bytes, mime_for_extension(&ext))
            .await
            .map_err(|e| CatalogError::Storage(e.to_string()))?;

        let material = Material {
            id: id.to_string(),
            subject_name: subject_name.to_string(),
            description: description.to_string(),
            teacher_id: teacher.user_id.clone(),
            stored_file: Some(StoredFile::DirectPath(path.clone())),
            created_at,
        };

        if let Err(e) = self.store.insert(&material) {
            if let Err(cleanup) = self.storage.delete(&path).await {
                tracing::warn!("Failed to remove orphaned object {}: {}", path, cleanup);
            }
            return Err(CatalogError::Store(e.to_string()));
        }

        tracing::info!(
            "Teacher {} uploaded material {} ({})",
            teacher.user_id,
            material.id,
            path
        );
        Ok(material)
    }

    /// All materials, newest first.
    pub fn list_all(&self) -> Result<Vec<MaterialListing>, CatalogError> {
        self.store
            .list(None)
            .map_err(|e| CatalogError::Store(e.to_string()))
    }

    /// One teacher's materials, newest first.
    pub fn list_for_teacher(&self, teacher_id: &str) -> Result<Vec<MaterialListing>, CatalogError> {
        self.store
            .list(Some(teacher_id))
            .map_err(|e| CatalogError::Store(e.to_string()))
    }

    /// Material detail.
    pub fn get(&self, material_id: &str) -> Result<MaterialListing, CatalogError> {
        self.store
            .get(material_id)
            .map_err(|e| CatalogError::Store(e.to_string()))?
            .ok_or_else(|| CatalogError::NotFound(material_id.to_string()))
    }

    /// Delete a material the caller owns.
    ///
    /// The row goes first. A failure to remove the stored file afterwards
    /// does not restore the row; it is returned as a warning.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        material_id: &str,
    ) -> Result<DeleteOutcome, CatalogError> {
        let teacher = ctx.require_teacher()?;
        let listing = self.get(material_id)?;
        if listing.material.teacher_id != teacher.user_id {
            return Err(CatalogError::NotOwner(material_id.to_string()));
        }

        let removed = self
            .store
            .delete(material_id)
            .map_err(|e| CatalogError::Store(e.to_string()))?;
        if !removed {
            return Err(CatalogError::NotFound(material_id.to_string()));
        }

        let object_path = listing
            .material
            .stored_file
            .as_ref()
            .and_then(|f| f.object_path(self.storage.bucket()));

        let storage_warning = match object_path {
            Some(path) => match self.storage.delete(&path).await {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(
                        "Material {} deleted but its file {} was not: {}",
                        material_id,
                        path,
                        e
                    );
                    Some(e.to_string())
                }
            },
            None => {
                tracing::warn!("Material {} deleted; no stored file path to remove", material_id);
                Some("no stored file path".to_string())
            }
        };

        tracing::info!("Teacher {} deleted material {}", teacher.user_id, material_id);
        Ok(DeleteOutcome {
            material_id: material_id.to_string(),
            storage_warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::identity::{Role, Session};
    use crate::material::SignedFileReference;
    use crate::store::SqliteMaterialStore;
    use async_trait::async_trait;
    use lectern_core::{AppError, AppResult};
    use rusqlite::params;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryStorage {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        fail_delete: bool,
    }

    #[async_trait]
    impl ObjectStorage for MemoryStorage {
        fn bucket(&self) -> &str {
            "materials"
        }

        async fn upload(&self, path: &str, bytes: &[u8], _content_type: &str) -> AppResult<()> {
            self.objects.lock().unwrap().insert(path.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn delete(&self, path: &str) -> AppResult<()> {
            if self.fail_delete {
                return Err(AppError::Storage("bucket offline".to_string()));
            }
            self.objects
                .lock()
                .unwrap()
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| AppError::Storage(format!("missing {}", path)))
        }

        async fn sign_url(&self, path: &str, _ttl: Duration) -> AppResult<SignedFileReference> {
            Err(AppError::Storage(format!("not signing {}", path)))
        }

        async fn read(&self, path: &str) -> AppResult<Option<Vec<u8>>> {
            Ok(self.objects.lock().unwrap().get(path).cloned())
        }
    }

    fn session(user_id: &str, role: Role) -> RequestContext {
        RequestContext::authenticated(Session {
            token: format!("tok-{}", user_id),
            user_id: user_id.to_string(),
            full_name: user_id.to_uppercase(),
            role,
        })
    }

    fn setup(storage: MemoryStorage) -> (Catalog, Arc<MemoryStorage>) {
        let db = Database::open_in_memory().unwrap();
        for id in ["t1", "t2"] {
            db.with_conn(|conn| {
                conn.execute(
                    "INSERT INTO profiles (id, email, full_name, role, password_hash, updated_at) \
                     VALUES (?1, ?2, ?3, 'teacher', 'x', '2024-01-01T00:00:00Z')",
                    params![id, format!("{}@school.test", id), format!("Teacher {}", id)],
                )
            })
            .unwrap();
        }
        let storage = Arc::new(storage);
        let catalog = Catalog::new(Arc::new(SqliteMaterialStore::new(db)), storage.clone());
        (catalog, storage)
    }

    fn upload(subject: &str) -> NewMaterial {
        NewMaterial {
            subject_name: subject.to_string(),
            description: "Kinematics and forces".to_string(),
            file_name: "lecture.PDF".to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_stores_object_under_teacher_prefix() {
        let (catalog, storage) = setup(MemoryStorage::default());

        let material = catalog.upload(&session("t1", Role::Teacher), upload("Physics 101")).await.unwrap();
        let Some(StoredFile::DirectPath(path)) = &material.stored_file else {
            panic!("expected direct path");
        };
        assert!(path.starts_with("public/t1/"));
        assert!(path.ends_with(".pdf"));
        assert!(storage.objects.lock().unwrap().contains_key(path));

        let listing = catalog.get(&material.id).unwrap();
        assert_eq!(listing.teacher_name.as_deref(), Some("Teacher t1"));
        assert_eq!(listing.file_extension.as_deref(), Some("pdf"));
    }

    #[tokio::test]
    async fn test_back_to_back_uploads_get_distinct_objects() {
        let (catalog, storage) = setup(MemoryStorage::default());
        let ctx = session("t1", Role::Teacher);

        let mut paths = Vec::new();
        for subject in ["Physics 101", "Physics 102", "Physics 103"] {
            let material = catalog.upload(&ctx, upload(subject)).await.unwrap();
            let Some(StoredFile::DirectPath(path)) = material.stored_file else {
                panic!("expected direct path");
            };
            assert!(path.contains(&material.id.replace('-', "")));
            paths.push(path);
        }

        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 3);
        assert_eq!(storage.objects.lock().unwrap().len(), 3);
        assert_eq!(catalog.list_for_teacher("t1").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_upload_requires_teacher() {
        let (catalog, _) = setup(MemoryStorage::default());

        let student = catalog.upload(&session("s1", Role::Student), upload("X")).await;
        assert!(matches!(student, Err(CatalogError::Identity(IdentityError::Forbidden))));

        let anonymous = catalog.upload(&RequestContext::anonymous(), upload("X")).await;
        assert!(matches!(
            anonymous,
            Err(CatalogError::Identity(IdentityError::Unauthenticated))
        ));
    }

    #[tokio::test]
    async fn test_upload_validates_fields() {
        let (catalog, storage) = setup(MemoryStorage::default());
        let ctx = session("t1", Role::Teacher);

        let mut blank = upload("  ");
        assert!(matches!(catalog.upload(&ctx, blank.clone()).await, Err(CatalogError::InvalidUpload(_))));

        blank = upload("Physics");
        blank.bytes.clear();
        assert!(matches!(catalog.upload(&ctx, blank).await, Err(CatalogError::InvalidUpload(_))));

        let mut no_ext = upload("Physics");
        no_ext.file_name = "lecture".to_string();
        assert!(matches!(catalog.upload(&ctx, no_ext).await, Err(CatalogError::InvalidUpload(_))));

        assert!(storage.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_insert_removes_object() {
        let (catalog, storage) = setup(MemoryStorage::default());

        // Teacher without a profile row violates the foreign key.
        let result = catalog.upload(&session("ghost", Role::Teacher), upload("X")).await;
        assert!(matches!(result, Err(CatalogError::Store(_))));
        assert!(storage.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listings_are_scoped() {
        let (catalog, _) = setup(MemoryStorage::default());
        catalog.upload(&session("t1", Role::Teacher), upload("A")).await.unwrap();
        catalog.upload(&session("t2", Role::Teacher), upload("B")).await.unwrap();

        assert_eq!(catalog.list_all().unwrap().len(), 2);
        let mine = catalog.list_for_teacher("t2").unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].material.subject_name, "B");
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let (catalog, storage) = setup(MemoryStorage::default());
        let ctx = session("t1", Role::Teacher);
        let material = catalog.upload(&ctx, upload("A")).await.unwrap();

        let outcome = catalog.delete(&ctx, &material.id).await.unwrap();
        assert_eq!(outcome.storage_warning, None);
        assert!(catalog.list_for_teacher("t1").unwrap().is_empty());
        assert!(storage.objects.lock().unwrap().is_empty());

        let again = catalog.delete(&ctx, &material.id).await;
        assert!(matches!(again, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let (catalog, _) = setup(MemoryStorage::default());
        let material = catalog.upload(&session("t1", Role::Teacher), upload("A")).await.unwrap();

        let other = catalog.delete(&session("t2", Role::Teacher), &material.id).await;
        assert!(matches!(other, Err(CatalogError::NotOwner(_))));
        assert!(catalog.get(&material.id).is_ok());
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_row_deleted() {
        let (catalog, _) = setup(MemoryStorage {
            fail_delete: true,
            ..Default::default()
        });
        let ctx = session("t1", Role::Teacher);
        let material = catalog.upload(&ctx, upload("A")).await.unwrap();

        let outcome = catalog.delete(&ctx, &material.id).await.unwrap();
        assert!(outcome.storage_warning.unwrap().contains("bucket offline"));
        assert!(matches!(catalog.get(&material.id), Err(CatalogError::NotFound(_))));
    }
}
