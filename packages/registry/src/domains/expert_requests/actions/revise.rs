use chrono::Utc;
use tracing::{info, warn};

use super::{missed_transition, ExpertSubmission};
use crate::common::auth::Identity;
use crate::common::{ExpertRequestId, RegistryError, RegistryResult};
use crate::domains::expert_requests::models::{
    ExpertRequest, ExpertRequestRevision, ExpertRequestStatus,
};
use crate::kernel::ServerDeps;

/// Replace the profile on an expert request.
///
/// Reviewers may amend a request while it is pending. The creator may only
/// resubmit after a rejection, which puts it back to pending and clears the
/// previous review. Everyone else is forbidden.
///
/// A document left out of the submission stays as stored; `remove_cv` and
/// `remove_approval_document` clear it.
pub async fn revise(
    identity: &Identity,
    request_id: ExpertRequestId,
    submission: ExpertSubmission,
    deps: &ServerDeps,
) -> RegistryResult<ExpertRequest> {
    let current = deps
        .store
        .find_expert_request(request_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("expert request"))?;

    let expected = match current.status {
        ExpertRequestStatus::Pending if identity.is_privileged() => ExpertRequestStatus::Pending,
        ExpertRequestStatus::Rejected if identity.is(current.created_by) => {
            ExpertRequestStatus::Rejected
        }
        status => {
            warn!(
                request_id = %request_id,
                caller = %identity.subject,
                status = %status,
                "Expert request revision denied"
            );
            return Err(RegistryError::Forbidden);
        }
    };

    let valid = submission.validate()?;
    let revision = ExpertRequestRevision {
        cv_document: valid.cv_patch(),
        approval_document: valid.approval_patch(),
        profile: valid.profile,
    };

    let Some(revised) = deps
        .store
        .revise_expert_request(request_id, expected, &revision, Utc::now())
        .await?
    else {
        return Err(missed_transition(request_id, deps).await?);
    };

    info!(
        request_id = %request_id,
        revised_by = %identity.subject,
        previous_status = %expected,
        "Expert request revised"
    );
    Ok(revised)
}
