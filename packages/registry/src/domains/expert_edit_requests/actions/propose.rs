use tracing::info;

use super::EditProposal;
use crate::common::auth::Identity;
use crate::common::{ExpertId, RegistryError, RegistryResult};
use crate::domains::expert_edit_requests::models::ExpertEditRequest;
use crate::kernel::ServerDeps;

/// Propose a change to a live expert. Any authenticated caller.
///
/// The changed-field set is computed here against the current expert; the
/// caller never supplies it.
pub async fn propose(
    identity: &Identity,
    expert_id: ExpertId,
    proposal: EditProposal,
    deps: &ServerDeps,
) -> RegistryResult<ExpertEditRequest> {
    let expert = deps
        .store
        .find_expert(expert_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("expert"))?;

    let prepared = proposal.prepare(&expert)?;

    let request = ExpertEditRequest::new(
        expert_id,
        prepared.changes,
        prepared.fields_changed,
        prepared.change_summary,
        prepared.change_reason,
        identity.subject,
    );
    deps.store.insert_edit_request(&request).await?;

    info!(
        edit_request_id = %request.id,
        expert_id = %expert_id,
        created_by = %identity.subject,
        fields = ?request.fields_changed,
        "Edit request proposed"
    );
    Ok(request)
}
