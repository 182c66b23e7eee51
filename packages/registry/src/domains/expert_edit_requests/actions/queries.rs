use serde::Deserialize;

use crate::common::auth::Identity;
use crate::common::{
    ExpertEditRequestId, ExpertId, Page, PageRequest, RegistryError, RegistryResult, UserId,
};
use crate::domains::expert_edit_requests::models::{
    EditRequestFilter, EditRequestStatus, ExpertEditRequest,
};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EditRequestQuery {
    pub status: Option<EditRequestStatus>,
    /// Honoured for reviewers only
    pub created_by: Option<UserId>,
    pub expert_id: Option<ExpertId>,
    #[serde(flatten)]
    pub page: PageRequest,
}

pub async fn get_edit_request(
    identity: &Identity,
    request_id: ExpertEditRequestId,
    deps: &ServerDeps,
) -> RegistryResult<ExpertEditRequest> {
    let request = deps
        .store
        .find_edit_request(request_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("edit request"))?;

    if !identity.is_privileged() && !identity.is(request.created_by) {
        return Err(RegistryError::Forbidden);
    }
    Ok(request)
}

pub async fn list_edit_requests(
    identity: &Identity,
    query: EditRequestQuery,
    deps: &ServerDeps,
) -> RegistryResult<Page<ExpertEditRequest>> {
    let (limit, offset) = deps.page_limits.resolve(&query.page);
    let filter = EditRequestFilter {
        status: query.status,
        created_by: identity.visible_creator(query.created_by),
        expert_id: query.expert_id,
        limit,
        offset,
    };

    let (items, total) = deps.store.list_edit_requests(&filter).await?;
    Ok(Page::new(items, total, limit, offset))
}
