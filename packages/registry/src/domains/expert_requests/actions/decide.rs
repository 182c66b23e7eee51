use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::missed_transition;
use crate::common::auth::{Identity, Role};
use crate::common::{ExpertRequestId, RegistryError, RegistryResult};
use crate::domains::documents::DocumentRef;
use crate::domains::expert_requests::models::{ExpertRequest, ExpertRequestStatus};
use crate::kernel::ServerDeps;

/// A reviewer's verdict on a pending expert request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// A supplied document wins over the one stored on the request.
    Approve {
        #[serde(default)]
        approval_document: Option<DocumentRef>,
    },
    Reject { reason: String },
}

/// Approve or reject a pending expert request. Admin-or-higher.
///
/// Approval creates the expert, links it to the request and stamps the
/// review in one store transaction.
pub async fn decide(
    identity: &Identity,
    request_id: ExpertRequestId,
    decision: Decision,
    deps: &ServerDeps,
) -> RegistryResult<ExpertRequest> {
    identity.require(Role::Admin).inspect_err(|_| {
        warn!(request_id = %request_id, caller = %identity.subject, "Expert request decision denied");
    })?;

    let request = deps
        .store
        .find_expert_request(request_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("expert request"))?;

    if request.status != ExpertRequestStatus::Pending {
        warn!(request_id = %request_id, status = %request.status, "Expert request already decided");
        return Err(RegistryError::conflict(format!(
            "expert request is {}",
            request.status
        )));
    }

    let now = Utc::now();
    let decided = match decision {
        Decision::Approve { approval_document } => {
            let document = DocumentRef::non_blank(approval_document.as_ref())
                .or_else(|| DocumentRef::non_blank(request.approval_document.as_ref()))
                .cloned()
                .ok_or_else(|| {
                    RegistryError::validation("approvalDocument", "approval document required")
                })?;

            let expert = request.to_expert(document, now);
            deps.store
                .approve_expert_request(request_id, &expert, identity.subject, now)
                .await?
        }
        Decision::Reject { reason } => {
            let reason = reason.trim();
            if reason.is_empty() {
                return Err(RegistryError::validation(
                    "rejectionReason",
                    "rejection reason is required",
                ));
            }
            deps.store
                .reject_expert_request(request_id, reason, identity.subject, now)
                .await?
        }
    };

    let Some(decided) = decided else {
        let error = missed_transition(request_id, deps).await?;
        warn!(request_id = %request_id, error = %error, "Expert request decision lost");
        return Err(error);
    };

    info!(
        request_id = %request_id,
        reviewer = %identity.subject,
        status = %decided.status,
        expert_id = ?decided.expert_id,
        "Expert request decided"
    );
    Ok(decided)
}
