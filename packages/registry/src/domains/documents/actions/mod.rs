//! Documents domain actions

mod discard_documents;
mod upload_document;

pub use discard_documents::discard_documents;
pub use upload_document::{upload_document, DocumentUpload};
