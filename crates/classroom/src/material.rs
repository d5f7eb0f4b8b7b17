//! Material domain types.

use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

/// Where a material's file lives in object storage.
///
/// Rows written by the current upload flow carry the object path directly.
/// Older rows only kept the public URL of the object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum StoredFile {
    /// Object path inside the bucket, e.g. `public/<teacher>/<millis>.pdf`
    DirectPath(String),
    /// Public URL of the object, e.g. `https://host/storage/v1/object/public/materials/...`
    LegacyUrl(String),
}

impl StoredFile {
    /// Build from the two nullable database columns. The path column wins.
    pub fn from_columns(file_path: Option<String>, file_url: Option<String>) -> Option<Self> {
        let file_path = file_path.filter(|p| !p.trim().is_empty());
        let file_url = file_url.filter(|u| !u.trim().is_empty());

        match (file_path, file_url) {
            (Some(path), _) => Some(Self::DirectPath(path)),
            (None, Some(url)) => Some(Self::LegacyUrl(url)),
            (None, None) => None,
        }
    }

    /// Object path inside `bucket`, if one can be derived.
    ///
    /// Legacy URLs are cut after the first `/<bucket>/` segment; any query
    /// string or fragment is dropped and percent-escapes are decoded.
    pub fn object_path(&self, bucket: &str) -> Option<String> {
        match self {
            Self::DirectPath(path) => {
                let path = path.trim_start_matches('/');
                (!path.is_empty()).then(|| path.to_string())
            }
            Self::LegacyUrl(url) => {
                let marker = format!("/{}/", bucket);
                let start = url.find(&marker)? + marker.len();
                let rest = &url[start..];
                let end = rest.find(['?', '#']).unwrap_or(rest.len());
                let path = percent_decode_str(&rest[..end]).decode_utf8().ok()?;
                (!path.is_empty()).then(|| path.into_owned())
            }
        }
    }

    /// Lower-cased file extension of the stored object.
    pub fn extension(&self) -> Option<String> {
        let raw = match self {
            Self::DirectPath(path) => path.as_str(),
            Self::LegacyUrl(url) => url.split(['?', '#']).next().unwrap_or_default(),
        };
        file_extension(raw)
    }
}

/// A course material uploaded by a teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub subject_name: String,
    pub description: String,
    pub teacher_id: String,
    pub stored_file: Option<StoredFile>,
    pub created_at: DateTime<Utc>,
}

/// A material together with its owner's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialListing {
    #[serde(flatten)]
    pub material: Material,

    /// Full name of the owning teacher, absent if the profile is gone
    pub teacher_name: Option<String>,

    /// Extension of the stored file, for display
    pub file_extension: Option<String>,
}

impl MaterialListing {
    pub fn new(material: Material, teacher_name: Option<String>) -> Self {
        let file_extension = material.stored_file.as_ref().and_then(StoredFile::extension);
        Self {
            material,
            teacher_name,
            file_extension,
        }
    }
}

/// Input for a material upload.
#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub subject_name: String,
    pub description: String,
    /// Original file name, used only for its extension
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A time-limited, authenticated URL to a stored file. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedFileReference {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Lower-cased extension of a file name or path, without the dot.
pub fn file_extension(name: &str) -> Option<String> {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// MIME type for the material formats teachers upload.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    }
}
