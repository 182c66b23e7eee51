use crate::common::{ExpertId, RegistryResult};
use crate::domains::experts::actions;
use crate::domains::experts::models::Expert;
use crate::kernel::ServerDeps;

/// Get an expert by ID
pub async fn get_expert(
    deps: &ServerDeps,
    bearer: Option<&str>,
    expert_id: ExpertId,
) -> RegistryResult<Expert> {
    let identity = deps.gate().require_authenticated(bearer)?;
    actions::get_expert(&identity, expert_id, deps).await
}
