//! Upload a document and hand back its reference

use tracing::{info, warn};

use crate::common::auth::Identity;
use crate::common::{RegistryError, RegistryResult};
use crate::domains::documents::{check_upload, DocumentMetadata, DocumentRef, DocumentType};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// One of `cv`, `approval`, `certificate`, `publication`, `other`
    pub document_type: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Store an upload owned by the caller.
///
/// The document type, size and content type are all checked before the
/// document service sees a single byte.
pub async fn upload_document(
    identity: &Identity,
    upload: DocumentUpload,
    deps: &ServerDeps,
) -> RegistryResult<DocumentRef> {
    let document_type: DocumentType = upload.document_type.parse().map_err(|_| {
        warn!(document_type = %upload.document_type, "Unknown document type");
        RegistryError::validation("documentType", "unknown document type")
    })?;

    let metadata = DocumentMetadata {
        file_name: upload.file_name,
        content_type: upload.content_type,
    };
    check_upload(&metadata, upload.bytes.len(), deps.max_document_bytes)?;

    let size = upload.bytes.len();
    let document = deps
        .documents
        .create_document(identity.subject, upload.bytes, &metadata, document_type)
        .await?;

    info!(
        document = %document,
        owner = %identity.subject,
        document_type = %document_type,
        size,
        "Document uploaded"
    );
    Ok(document)
}
