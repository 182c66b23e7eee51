use chrono::Utc;
use tracing::{info, warn};

use super::{missed_transition, EditProposal};
use crate::common::auth::Identity;
use crate::common::{ExpertEditRequestId, RegistryError, RegistryResult};
use crate::domains::expert_edit_requests::models::{EditRequestStatus, ExpertEditRequest};
use crate::kernel::ServerDeps;

/// Replace the change set of an edit request.
///
/// Same rule as expert requests: reviewers while pending, the creator only
/// after a rejection. The changed fields are recomputed against the expert
/// as it is now.
pub async fn revise(
    identity: &Identity,
    request_id: ExpertEditRequestId,
    proposal: EditProposal,
    deps: &ServerDeps,
) -> RegistryResult<ExpertEditRequest> {
    let current = deps
        .store
        .find_edit_request(request_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("edit request"))?;

    let expected = match current.status {
        EditRequestStatus::Pending if identity.is_privileged() => EditRequestStatus::Pending,
        EditRequestStatus::Rejected if identity.is(current.created_by) => {
            EditRequestStatus::Rejected
        }
        status => {
            warn!(
                edit_request_id = %request_id,
                caller = %identity.subject,
                status = %status,
                "Edit revision denied"
            );
            return Err(RegistryError::Forbidden);
        }
    };

    let expert = deps
        .store
        .find_expert(current.expert_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("expert"))?;
    let revision = proposal.prepare(&expert)?;

    let Some(revised) = deps
        .store
        .revise_edit_request(request_id, expected, &revision, Utc::now())
        .await?
    else {
        return Err(missed_transition(request_id, deps).await?);
    };

    info!(
        edit_request_id = %request_id,
        revised_by = %identity.subject,
        fields = ?revised.fields_changed,
        "Edit request revised"
    );
    Ok(revised)
}
