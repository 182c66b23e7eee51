use tracing::{info, warn};

use crate::domains::documents::DocumentRef;
use crate::kernel::ServerDeps;

/// Delete documents a committed change no longer references.
///
/// Best-effort: the change is already stored, so a failed delete only
/// leaves an orphaned file behind and is logged.
pub async fn discard_documents(documents: &[DocumentRef], deps: &ServerDeps) {
    for document in documents {
        match deps.documents.delete_document(document).await {
            Ok(()) => info!(document = %document, "Discarded superseded document"),
            Err(e) => warn!(document = %document, error = %e, "Failed to discard superseded document"),
        }
    }
}
