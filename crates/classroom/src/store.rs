//! Material metadata persistence.

use crate::db::Database;
use crate::material::{Material, MaterialListing, StoredFile};
use chrono::{DateTime, SecondsFormat, Utc};
use lectern_core::AppResult;
use rusqlite::{params, OptionalExtension, Row};

/// Metadata store for material rows.
pub trait MaterialStore: Send + Sync {
    /// Insert a new material row.
    fn insert(&self, material: &Material) -> AppResult<()>;

    /// Fetch a single material with its teacher's name.
    fn get(&self, id: &str) -> AppResult<Option<MaterialListing>>;

    /// List materials newest first, optionally only those of one teacher.
    fn list(&self, teacher_id: Option<&str>) -> AppResult<Vec<MaterialListing>>;

    /// Delete a row. Returns `false` if no row had that id.
    fn delete(&self, id: &str) -> AppResult<bool>;
}

/// SQLite-backed [`MaterialStore`].
#[derive(Clone)]
pub struct SqliteMaterialStore {
    db: Database,
}

const SELECT_LISTING: &str = "SELECT m.id, m.subject_name, m.description, m.teacher_id, \
     m.file_path, m.file_url, m.created_at, p.full_name \
     FROM materials m LEFT JOIN profiles p ON p.id = m.teacher_id";

impl SqliteMaterialStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a row that only carries a public URL, as older uploads did.
    pub fn insert_legacy(&self, material: &Material, file_url: &str) -> AppResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO materials (id, subject_name, description, teacher_id, file_path, file_url, created_at) \
                 VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)",
                params![
                    material.id,
                    material.subject_name,
                    material.description,
                    material.teacher_id,
                    file_url,
                    timestamp(&material.created_at),
                ],
            )
        })?;
        Ok(())
    }
}

impl MaterialStore for SqliteMaterialStore {
    fn insert(&self, material: &Material) -> AppResult<()> {
        let (file_path, file_url) = match &material.stored_file {
            Some(StoredFile::DirectPath(path)) => (Some(path.as_str()), None),
            Some(StoredFile::LegacyUrl(url)) => (None, Some(url.as_str())),
            None => (None, None),
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO materials (id, subject_name, description, teacher_id, file_path, file_url, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    material.id,
                    material.subject_name,
                    material.description,
                    material.teacher_id,
                    file_path,
                    file_url,
                    timestamp(&material.created_at),
                ],
            )
        })?;

        tracing::debug!("Inserted material {} for teacher {}", material.id, material.teacher_id);
        Ok(())
    }

    fn get(&self, id: &str) -> AppResult<Option<MaterialListing>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("{} WHERE m.id = ?1", SELECT_LISTING),
                params![id],
                listing_from_row,
            )
            .optional()
        })
    }

    fn list(&self, teacher_id: Option<&str>) -> AppResult<Vec<MaterialListing>> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "{} WHERE (?1 IS NULL OR m.teacher_id = ?1) ORDER BY m.created_at DESC, m.rowid DESC",
                SELECT_LISTING
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![teacher_id], listing_from_row)?;
            rows.collect()
        })
    }

    fn delete(&self, id: &str) -> AppResult<bool> {
        let removed = self
            .db
            .with_conn(|conn| conn.execute("DELETE FROM materials WHERE id = ?1", params![id]))?;
        Ok(removed > 0)
    }
}

/// RFC 3339 with fixed precision, so text order matches time order.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<MaterialListing> {
    let created_at: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    let material = Material {
        id: row.get(0)?,
        subject_name: row.get(1)?,
        description: row.get(2)?,
        teacher_id: row.get(3)?,
        stored_file: StoredFile::from_columns(row.get(4)?, row.get(5)?),
        created_at,
    };

    Ok(MaterialListing::new(material, row.get(7)?))
}
