use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::missed_transition;
use crate::common::auth::{Identity, Role};
use crate::common::{ExpertEditRequestId, RegistryError, RegistryResult};
use crate::domains::expert_edit_requests::models::{
    EditRequestStatus, EditTransition, ExpertEditRequest,
};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum EditDecision {
    Approve {
        #[serde(default)]
        admin_notes: Option<String>,
    },
    Reject {
        reason: String,
        #[serde(default)]
        admin_notes: Option<String>,
    },
}

/// Approve or reject a pending edit. Admin-or-higher.
///
/// Approval leaves the expert untouched; it only allows a later `apply`.
pub async fn decide(
    identity: &Identity,
    request_id: ExpertEditRequestId,
    decision: EditDecision,
    deps: &ServerDeps,
) -> RegistryResult<ExpertEditRequest> {
    identity.require(Role::Admin).inspect_err(|_| {
        warn!(edit_request_id = %request_id, caller = %identity.subject, "Edit decision denied");
    })?;

    let request = deps
        .store
        .find_edit_request(request_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("edit request"))?;

    if request.status != EditRequestStatus::Pending {
        warn!(edit_request_id = %request_id, status = %request.status, "Edit request already decided");
        return Err(RegistryError::conflict(format!(
            "edit request is {}",
            request.status
        )));
    }

    let transition = match decision {
        EditDecision::Approve { admin_notes } => EditTransition::Decide {
            status: EditRequestStatus::Approved,
            reviewer: identity.subject,
            rejection_reason: None,
            admin_notes: non_empty(admin_notes),
        },
        EditDecision::Reject {
            reason,
            admin_notes,
        } => {
            let reason = reason.trim();
            if reason.is_empty() {
                return Err(RegistryError::validation(
                    "rejectionReason",
                    "rejection reason is required",
                ));
            }
            EditTransition::Decide {
                status: EditRequestStatus::Rejected,
                reviewer: identity.subject,
                rejection_reason: Some(reason.to_string()),
                admin_notes: non_empty(admin_notes),
            }
        }
    };

    let Some(decided) = deps
        .store
        .transition_edit_request(request_id, &transition, Utc::now())
        .await?
    else {
        let error = missed_transition(request_id, deps).await?;
        warn!(edit_request_id = %request_id, error = %error, "Edit decision lost");
        return Err(error);
    };

    info!(
        edit_request_id = %request_id,
        reviewer = %identity.subject,
        status = %decided.status,
        "Edit request decided"
    );
    Ok(decided)
}

fn non_empty(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}
