//! Email/password login

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::common::auth::Identity;
use crate::common::{RegistryError, RegistryResult};
use crate::domains::users::models::normalize_email;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    #[serde(skip)]
    pub identity: Identity,
}

/// Exchange an email and password for a signed token.
///
/// Unknown email, inactive account and wrong password are the same
/// `Unauthenticated`. Unknown emails still pay for one hash verification.
pub async fn login(email: &str, password: &str, deps: &ServerDeps) -> RegistryResult<LoginResult> {
    let email = normalize_email(email);

    let Some(user) = deps.store.find_user_by_email(&email).await? else {
        deps.verifier.verify_dummy(password);
        warn!("Login failed: unknown account");
        return Err(RegistryError::Unauthenticated);
    };

    let password_ok = deps.verifier.verify_password(password, &user.password_hash);
    if !password_ok || !user.is_active {
        warn!(user_id = %user.id, "Login failed");
        return Err(RegistryError::Unauthenticated);
    }

    deps.store.record_login(user.id, Utc::now()).await?;

    let issued = deps
        .verifier
        .issue_token(user.id, &user.name, &user.email, user.role)?;

    info!(user_id = %user.id, role = %user.role, "User logged in");
    Ok(LoginResult {
        token: issued.token,
        identity: issued.identity,
    })
}
