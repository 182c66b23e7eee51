use tracing::info;

use crate::common::RegistryResult;
use crate::domains::documents::actions::{self, DocumentUpload};
use crate::domains::documents::DocumentRef;
use crate::kernel::ServerDeps;

/// Upload a CV, approval letter or other supporting document
pub async fn upload_document(
    deps: &ServerDeps,
    bearer: Option<&str>,
    upload: DocumentUpload,
) -> RegistryResult<DocumentRef> {
    let identity = deps.gate().require_authenticated(bearer)?;
    info!(document_type = %upload.document_type, "upload_document mutation called");

    actions::upload_document(&identity, upload, deps).await
}
