//! Bearer credential checks run in front of every registry operation.
//!
//! The gate turns a raw `Authorization` value into a verified `Identity`,
//! or fails with `AuthError`. The identity is returned to the caller and
//! passed explicitly into actions; nothing is stored between calls.

use tracing::debug;

use super::{AuthError, Identity, Role};
use crate::domains::auth::CredentialVerifier;

pub struct AuthorizationGate<'a> {
    verifier: &'a CredentialVerifier,
}

impl<'a> AuthorizationGate<'a> {
    pub fn new(verifier: &'a CredentialVerifier) -> Self {
        Self { verifier }
    }

    /// Verify a bearer credential.
    ///
    /// Accepts either `Bearer <token>` or the bare token. Every failure is
    /// the same `Unauthenticated`.
    pub fn require_authenticated(&self, bearer: Option<&str>) -> Result<Identity, AuthError> {
        let token = bearer
            .map(extract_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                debug!("missing bearer credential");
                AuthError::Unauthenticated
            })?;

        let identity = self.verifier.verify_token(token)?;
        debug!(subject = %identity.subject, role = %identity.role, "caller authenticated");
        Ok(identity)
    }

    /// Verify a bearer credential and require the capabilities of `role`.
    pub fn require_role(&self, bearer: Option<&str>, role: Role) -> Result<Identity, AuthError> {
        let identity = self.require_authenticated(bearer)?;
        identity.require(role).inspect_err(|_| {
            debug!(subject = %identity.subject, required = %role, "caller lacks role");
        })?;
        Ok(identity)
    }
}

fn extract_token(header: &str) -> &str {
    let header = header.trim();
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim()
}
