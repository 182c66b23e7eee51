use tracing::info;

use crate::common::auth::Role;
use crate::common::{ExpertRequestId, RegistryResult};
use crate::domains::documents::DocumentRef;
use crate::domains::expert_requests::actions::{self, BatchOutcome, Decision, ExpertSubmission};
use crate::domains::expert_requests::models::ExpertRequest;
use crate::kernel::ServerDeps;

/// Submit a new expert for review
pub async fn submit_expert_request(
    deps: &ServerDeps,
    bearer: Option<&str>,
    submission: ExpertSubmission,
) -> RegistryResult<ExpertRequest> {
    let identity = deps.gate().require_authenticated(bearer)?;
    info!(caller = %identity.subject, "submit_expert_request mutation called");

    actions::submit(&identity, submission, deps).await
}

/// Approve or reject a pending request (admin only)
pub async fn decide_expert_request(
    deps: &ServerDeps,
    bearer: Option<&str>,
    request_id: ExpertRequestId,
    decision: Decision,
) -> RegistryResult<ExpertRequest> {
    let identity = deps.gate().require_role(bearer, Role::Admin)?;
    info!(request_id = %request_id, "decide_expert_request mutation called");

    actions::decide(&identity, request_id, decision, deps).await
}

/// Approve several pending requests with one approval document (admin only)
pub async fn batch_approve_expert_requests(
    deps: &ServerDeps,
    bearer: Option<&str>,
    request_ids: Vec<ExpertRequestId>,
    approval_document: DocumentRef,
) -> RegistryResult<BatchOutcome> {
    let identity = deps.gate().require_role(bearer, Role::Admin)?;
    info!(count = request_ids.len(), "batch_approve_expert_requests mutation called");

    actions::batch_decide(&identity, &request_ids, approval_document, deps).await
}

/// Amend a pending request (admin) or resubmit a rejected one (creator)
pub async fn revise_expert_request(
    deps: &ServerDeps,
    bearer: Option<&str>,
    request_id: ExpertRequestId,
    submission: ExpertSubmission,
) -> RegistryResult<ExpertRequest> {
    let identity = deps.gate().require_authenticated(bearer)?;
    info!(request_id = %request_id, "revise_expert_request mutation called");

    actions::revise(&identity, request_id, submission, deps).await
}
