use serde::Deserialize;

use crate::common::auth::Identity;
use crate::common::{ExpertRequestId, Page, PageRequest, RegistryError, RegistryResult, UserId};
use crate::domains::expert_requests::models::{
    ExpertRequest, ExpertRequestFilter, ExpertRequestStatus,
};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExpertRequestQuery {
    pub status: Option<ExpertRequestStatus>,
    /// Honoured for reviewers only
    pub created_by: Option<UserId>,
    #[serde(flatten)]
    pub page: PageRequest,
}

/// Regular callers may only read requests they created.
pub async fn get_expert_request(
    identity: &Identity,
    request_id: ExpertRequestId,
    deps: &ServerDeps,
) -> RegistryResult<ExpertRequest> {
    let request = deps
        .store
        .find_expert_request(request_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("expert request"))?;

    if !identity.is_privileged() && !identity.is(request.created_by) {
        return Err(RegistryError::Forbidden);
    }
    Ok(request)
}

/// Newest first. Regular callers only ever see their own requests.
pub async fn list_expert_requests(
    identity: &Identity,
    query: ExpertRequestQuery,
    deps: &ServerDeps,
) -> RegistryResult<Page<ExpertRequest>> {
    let (limit, offset) = deps.page_limits.resolve(&query.page);
    let filter = ExpertRequestFilter {
        status: query.status,
        created_by: identity.visible_creator(query.created_by),
        limit,
        offset,
    };

    let (items, total) = deps.store.list_expert_requests(&filter).await?;
    Ok(Page::new(items, total, limit, offset))
}
