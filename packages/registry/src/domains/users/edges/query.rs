use crate::common::RegistryResult;
use crate::domains::users::actions;
use crate::domains::users::models::User;
use crate::kernel::ServerDeps;

/// The caller's own account
pub async fn me(deps: &ServerDeps, bearer: Option<&str>) -> RegistryResult<User> {
    let identity = deps.gate().require_authenticated(bearer)?;
    actions::current_user(&identity, deps).await
}
