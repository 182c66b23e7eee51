use tracing::info;

use crate::common::RegistryResult;
use crate::domains::auth::actions::{self, LoginResult};
use crate::kernel::ServerDeps;

/// Log in with email and password. The only operation without a bearer.
pub async fn login(deps: &ServerDeps, email: &str, password: &str) -> RegistryResult<LoginResult> {
    info!("login mutation called");
    actions::login(email, password, deps).await
}
