use crate::common::{ExpertEditRequestId, Page, RegistryResult};
use crate::domains::expert_edit_requests::actions::{self, EditRequestQuery};
use crate::domains::expert_edit_requests::models::ExpertEditRequest;
use crate::kernel::ServerDeps;

/// Get an edit request by ID
pub async fn get_expert_edit(
    deps: &ServerDeps,
    bearer: Option<&str>,
    request_id: ExpertEditRequestId,
) -> RegistryResult<ExpertEditRequest> {
    let identity = deps.gate().require_authenticated(bearer)?;
    actions::get_edit_request(&identity, request_id, deps).await
}

/// List edit requests visible to the caller
pub async fn list_expert_edits(
    deps: &ServerDeps,
    bearer: Option<&str>,
    query: EditRequestQuery,
) -> RegistryResult<Page<ExpertEditRequest>> {
    let identity = deps.gate().require_authenticated(bearer)?;
    actions::list_edit_requests(&identity, query, deps).await
}
