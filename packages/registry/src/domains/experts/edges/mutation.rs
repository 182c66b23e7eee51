use tracing::info;

use crate::common::auth::Role;
use crate::common::{ExpertId, RegistryResult};
use crate::domains::experts::actions;
use crate::domains::experts::models::{Expert, ProposedChanges};
use crate::kernel::ServerDeps;

/// Update an expert directly (admin only)
pub async fn update_expert(
    deps: &ServerDeps,
    bearer: Option<&str>,
    expert_id: ExpertId,
    changes: ProposedChanges,
) -> RegistryResult<Expert> {
    let identity = deps.gate().require_role(bearer, Role::Admin)?;
    info!(expert_id = %expert_id, "update_expert mutation called");

    actions::update_expert(&identity, expert_id, changes, deps).await
}
