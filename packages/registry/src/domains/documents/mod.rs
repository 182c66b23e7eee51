//! Documents domain - references to stored files (CVs, approval letters, ...)
//!
//! The bytes themselves live behind `BaseDocumentService`; this domain only
//! knows references, document types and upload checks.

pub mod actions;
pub mod edges;
pub mod models;

pub use models::document::{
    check_upload, extension_for, DocumentMetadata, DocumentPatch, DocumentRef, DocumentType,
    ALLOWED_CONTENT_TYPES,
};
