use serde::Deserialize;
use tracing::{info, warn};

use crate::common::auth::{Identity, Role};
use crate::common::validation::{ValidationErrors, Validator};
use crate::common::{RegistryError, RegistryResult};
use crate::domains::users::models::User;
use crate::kernel::ServerDeps;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
}

impl NewUser {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.required("email", &self.email)
            .email("email", &self.email)
            .required("name", &self.name)
            .custom(
                "password",
                self.password.chars().count() >= MIN_PASSWORD_LENGTH,
                "password must be at least 8 characters",
            );
        v.finish()
    }
}

/// Create an account on behalf of an admin.
///
/// Admins create regular users; elevated admins also create admins.
pub async fn create_user(
    identity: &Identity,
    input: NewUser,
    deps: &ServerDeps,
) -> RegistryResult<User> {
    if !identity.role.can_manage(input.role) {
        warn!(
            caller = %identity.subject,
            target_role = %input.role,
            "User creation denied"
        );
        return Err(RegistryError::Forbidden);
    }

    let user = insert_new_user(input, deps).await?;
    info!(user_id = %user.id, role = %user.role, created_by = %identity.subject, "User created");
    Ok(user)
}

/// Create an elevated admin without a caller. Used by the operator CLI to
/// seed an empty registry.
pub async fn bootstrap_admin(
    email: &str,
    name: &str,
    password: &str,
    deps: &ServerDeps,
) -> RegistryResult<User> {
    let input = NewUser {
        email: email.to_string(),
        name: name.to_string(),
        password: password.to_string(),
        role: Role::ElevatedAdmin,
    };

    let user = insert_new_user(input, deps).await?;
    info!(user_id = %user.id, "Bootstrapped elevated admin");
    Ok(user)
}

/// The account behind the caller's token.
pub async fn current_user(identity: &Identity, deps: &ServerDeps) -> RegistryResult<User> {
    deps.store
        .find_user(identity.subject)
        .await?
        .ok_or_else(|| RegistryError::not_found("user"))
}

async fn insert_new_user(input: NewUser, deps: &ServerDeps) -> RegistryResult<User> {
    input.validate()?;

    let hash = deps.verifier.hash_password(&input.password)?;
    let user = User::new(&input.email, &input.name, hash, input.role);

    if !deps.store.insert_user(&user).await? {
        return Err(RegistryError::conflict("email is already registered"));
    }
    Ok(user)
}
