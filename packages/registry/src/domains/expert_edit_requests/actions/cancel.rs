use chrono::Utc;
use tracing::{info, warn};

use super::missed_transition;
use crate::common::auth::Identity;
use crate::common::{ExpertEditRequestId, RegistryError, RegistryResult};
use crate::domains::expert_edit_requests::models::{
    EditRequestStatus, EditTransition, ExpertEditRequest,
};
use crate::kernel::ServerDeps;

/// Withdraw a pending edit. Only its creator may do this.
pub async fn cancel(
    identity: &Identity,
    request_id: ExpertEditRequestId,
    deps: &ServerDeps,
) -> RegistryResult<ExpertEditRequest> {
    let request = deps
        .store
        .find_edit_request(request_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("edit request"))?;

    if !identity.is(request.created_by) {
        warn!(edit_request_id = %request_id, caller = %identity.subject, "Edit cancel denied");
        return Err(RegistryError::Forbidden);
    }
    if request.status != EditRequestStatus::Pending {
        return Err(RegistryError::conflict(format!(
            "edit request is {}",
            request.status
        )));
    }

    let transition = EditTransition::Cancel {
        by: identity.subject,
    };
    let Some(cancelled) = deps
        .store
        .transition_edit_request(request_id, &transition, Utc::now())
        .await?
    else {
        return Err(missed_transition(request_id, deps).await?);
    };

    info!(edit_request_id = %request_id, "Edit request cancelled");
    Ok(cancelled)
}
