use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::missed_transition;
use crate::common::auth::{Identity, Role};
use crate::common::{ExpertEditRequestId, RegistryError, RegistryResult};
use crate::domains::documents::actions::discard_documents;
use crate::domains::expert_edit_requests::models::{
    EditApplication, EditRequestStatus, ExpertEditRequest,
};
use crate::domains::experts::models::Expert;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize)]
pub struct AppliedEdit {
    pub request: ExpertEditRequest,
    pub expert: Expert,
}

/// Write an approved edit into the live expert. Admin-or-higher.
///
/// The changes are merged into the expert as stored when the write happens,
/// and that write commits together with the `approved -> applied` flip. A
/// second apply ends in Conflict with the expert untouched, and two applies
/// of different edits to one expert both land. Documents the edit replaced
/// or removed are deleted afterwards.
pub async fn apply(
    identity: &Identity,
    request_id: ExpertEditRequestId,
    deps: &ServerDeps,
) -> RegistryResult<AppliedEdit> {
    identity.require(Role::Admin).inspect_err(|_| {
        warn!(edit_request_id = %request_id, caller = %identity.subject, "Edit apply denied");
    })?;

    let request = deps
        .store
        .find_edit_request(request_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("edit request"))?;

    match request.status {
        EditRequestStatus::Approved => {}
        EditRequestStatus::Applied => {
            warn!(edit_request_id = %request_id, "Edit request already applied");
            return Err(RegistryError::conflict("edit request is already applied"));
        }
        status => {
            return Err(RegistryError::conflict(format!(
                "edit request is {}, not approved",
                status
            )));
        }
    }

    // A dangling edit request reads as NotFound
    if deps.store.find_expert(request.expert_id).await?.is_none() {
        return Err(RegistryError::not_found("expert"));
    }

    let application = deps
        .store
        .apply_edit_request(request_id, identity.subject, Utc::now())
        .await?;

    let (applied, merge) = match application {
        Some(EditApplication::Applied { request, merge }) => (request, merge),
        Some(EditApplication::Invalid(errors)) => {
            warn!(edit_request_id = %request_id, errors = %errors, "Edit would leave expert incomplete");
            return Err(errors.into());
        }
        None => {
            let error = missed_transition(request_id, deps).await?;
            warn!(edit_request_id = %request_id, error = %error, "Edit apply lost");
            return Err(error);
        }
    };

    discard_documents(&merge.superseded_documents(), deps).await;

    info!(
        edit_request_id = %request_id,
        expert_id = %merge.after.id,
        applied_by = %identity.subject,
        fields = ?applied.fields_changed,
        "Edit request applied"
    );
    Ok(AppliedEdit {
        request: applied,
        expert: merge.after,
    })
}
