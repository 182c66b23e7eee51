use crate::common::auth::Identity;
use crate::common::{ExpertId, RegistryError, RegistryResult};
use crate::domains::experts::models::Expert;
use crate::kernel::ServerDeps;

/// Any authenticated caller may read a live expert.
pub async fn get_expert(
    _identity: &Identity,
    expert_id: ExpertId,
    deps: &ServerDeps,
) -> RegistryResult<Expert> {
    deps.store
        .find_expert(expert_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("expert"))
}
