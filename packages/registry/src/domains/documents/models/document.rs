use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::common::validation::ValidationErrors;

/// Opaque reference to a stored document, as handed out by the document
/// service (e.g. `cv/0190c1f2-....pdf`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct DocumentRef(String);

impl DocumentRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `Some` only for a reference that actually points somewhere.
    pub fn non_blank(reference: Option<&DocumentRef>) -> Option<&DocumentRef> {
        reference.filter(|r| !r.is_blank())
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Cv,
    Approval,
    Certificate,
    Publication,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Cv,
        DocumentType::Approval,
        DocumentType::Certificate,
        DocumentType::Publication,
        DocumentType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Cv => "cv",
            DocumentType::Approval => "approval",
            DocumentType::Certificate => "certificate",
            DocumentType::Publication => "publication",
            DocumentType::Other => "other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cv" => Ok(DocumentType::Cv),
            "approval" => Ok(DocumentType::Approval),
            "certificate" => Ok(DocumentType::Certificate),
            "publication" => Ok(DocumentType::Publication),
            "other" => Ok(DocumentType::Other),
            _ => Err(anyhow::anyhow!("Invalid document type: {}", s)),
        }
    }
}

/// Sparse edit of a document slot on an expert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "document", rename_all = "snake_case")]
pub enum DocumentPatch {
    Replace(DocumentRef),
    Remove,
}

impl DocumentPatch {
    /// True when applying this patch to `current` would change it.
    pub fn differs_from(&self, current: Option<&DocumentRef>) -> bool {
        match self {
            DocumentPatch::Replace(new) => current != Some(new),
            DocumentPatch::Remove => current.is_some(),
        }
    }

    /// The slot's value once the patch is applied.
    pub fn resulting_ref(&self) -> Option<DocumentRef> {
        match self {
            DocumentPatch::Replace(new) => Some(new.clone()),
            DocumentPatch::Remove => None,
        }
    }
}

/// Client-declared facts about an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub content_type: String,
}

pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
];

/// File extension used on disk for an accepted upload.
///
/// The uploaded name's extension is kept when it is one the declared content
/// type is known under; otherwise the content type's first registered
/// extension is used.
pub fn extension_for(metadata: &DocumentMetadata) -> Option<&'static str> {
    if !ALLOWED_CONTENT_TYPES.contains(&metadata.content_type.as_str()) {
        return None;
    }
    let known = mime_guess::get_mime_extensions_str(&metadata.content_type)?;

    let declared = Path::new(&metadata.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    declared
        .and_then(|ext| known.iter().copied().find(|known| *known == ext))
        .or_else(|| known.first().copied())
}

/// Size and content-type checks, run before any bytes are written.
pub fn check_upload(
    metadata: &DocumentMetadata,
    size: usize,
    max_bytes: usize,
) -> std::result::Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if metadata.file_name.trim().is_empty() {
        errors.add("fileName", "file name is required");
    }
    if size == 0 {
        errors.add("file", "file is empty");
    }
    if size > max_bytes {
        errors.add("file", format!("file exceeds the {} byte limit", max_bytes));
    }
    if !ALLOWED_CONTENT_TYPES.contains(&metadata.content_type.as_str()) {
        errors.add("contentType", "unsupported file type");
    }

    errors.into_result()
}
