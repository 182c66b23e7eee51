use tracing::info;

use crate::common::auth::Role;
use crate::common::{ExpertEditRequestId, ExpertId, RegistryResult};
use crate::domains::expert_edit_requests::actions::{
    self, AppliedEdit, EditDecision, EditProposal,
};
use crate::domains::expert_edit_requests::models::ExpertEditRequest;
use crate::kernel::ServerDeps;

/// Propose changes to an existing expert
pub async fn propose_expert_edit(
    deps: &ServerDeps,
    bearer: Option<&str>,
    expert_id: ExpertId,
    proposal: EditProposal,
) -> RegistryResult<ExpertEditRequest> {
    let identity = deps.gate().require_authenticated(bearer)?;
    info!(expert_id = %expert_id, "propose_expert_edit mutation called");

    actions::propose(&identity, expert_id, proposal, deps).await
}

/// Approve or reject a pending edit (admin only)
pub async fn decide_expert_edit(
    deps: &ServerDeps,
    bearer: Option<&str>,
    request_id: ExpertEditRequestId,
    decision: EditDecision,
) -> RegistryResult<ExpertEditRequest> {
    let identity = deps.gate().require_role(bearer, Role::Admin)?;
    info!(edit_request_id = %request_id, "decide_expert_edit mutation called");

    actions::decide(&identity, request_id, decision, deps).await
}

/// Apply an approved edit to the expert (admin only)
pub async fn apply_expert_edit(
    deps: &ServerDeps,
    bearer: Option<&str>,
    request_id: ExpertEditRequestId,
) -> RegistryResult<AppliedEdit> {
    let identity = deps.gate().require_role(bearer, Role::Admin)?;
    info!(edit_request_id = %request_id, "apply_expert_edit mutation called");

    actions::apply(&identity, request_id, deps).await
}

/// Withdraw one's own pending edit
pub async fn cancel_expert_edit(
    deps: &ServerDeps,
    bearer: Option<&str>,
    request_id: ExpertEditRequestId,
) -> RegistryResult<ExpertEditRequest> {
    let identity = deps.gate().require_authenticated(bearer)?;
    info!(edit_request_id = %request_id, "cancel_expert_edit mutation called");

    actions::cancel(&identity, request_id, deps).await
}

/// Amend a pending edit (admin) or resubmit a rejected one (creator)
pub async fn revise_expert_edit(
    deps: &ServerDeps,
    bearer: Option<&str>,
    request_id: ExpertEditRequestId,
    proposal: EditProposal,
) -> RegistryResult<ExpertEditRequest> {
    let identity = deps.gate().require_authenticated(bearer)?;
    info!(edit_request_id = %request_id, "revise_expert_edit mutation called");

    actions::revise(&identity, request_id, proposal, deps).await
}
