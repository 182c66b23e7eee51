use tracing::info;

use crate::common::auth::Role;
use crate::common::RegistryResult;
use crate::domains::users::actions::{self, NewUser};
use crate::domains::users::models::User;
use crate::kernel::ServerDeps;

/// Create a user account (admin only; admin accounts need an elevated admin)
pub async fn create_user(
    deps: &ServerDeps,
    bearer: Option<&str>,
    input: NewUser,
) -> RegistryResult<User> {
    let identity = deps.gate().require_role(bearer, Role::Admin)?;
    info!(caller = %identity.subject, "create_user mutation called");

    actions::create_user(&identity, input, deps).await
}
