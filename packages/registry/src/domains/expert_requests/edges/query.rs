use crate::common::{ExpertRequestId, Page, RegistryResult};
use crate::domains::expert_requests::actions::{self, ExpertRequestQuery};
use crate::domains::expert_requests::models::ExpertRequest;
use crate::kernel::ServerDeps;

/// Get an expert request by ID
pub async fn get_expert_request(
    deps: &ServerDeps,
    bearer: Option<&str>,
    request_id: ExpertRequestId,
) -> RegistryResult<ExpertRequest> {
    let identity = deps.gate().require_authenticated(bearer)?;
    actions::get_expert_request(&identity, request_id, deps).await
}

/// List expert requests visible to the caller
pub async fn list_expert_requests(
    deps: &ServerDeps,
    bearer: Option<&str>,
    query: ExpertRequestQuery,
) -> RegistryResult<Page<ExpertRequest>> {
    let identity = deps.gate().require_authenticated(bearer)?;
    actions::list_expert_requests(&identity, query, deps).await
}
