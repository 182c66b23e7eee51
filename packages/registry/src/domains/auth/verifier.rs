use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tracing::debug;

use super::jwt::TokenService;
use super::password::PasswordHashing;
use crate::common::auth::{AuthError, Identity, Role};
use crate::common::UserId;

/// A freshly signed token together with the identity it encodes.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub identity: Identity,
}

/// Hashes and checks passwords, issues and verifies identity tokens.
///
/// The signing secret is generated here, once, and never leaves this value.
/// Tokens signed by another verifier instance (another process, a previous
/// start) do not verify.
pub struct CredentialVerifier {
    tokens: TokenService,
    passwords: PasswordHashing,
    dummy_hash: String,
}

impl CredentialVerifier {
    pub fn new(issuer: String, token_ttl: Duration, hash_cost: u32) -> Result<Self> {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);

        let passwords = PasswordHashing::new(hash_cost)?;
        // Verified against for unknown accounts so login timing stays flat
        let dummy_hash = passwords.hash("registry-dummy-password")?;

        Ok(Self {
            tokens: TokenService::new(&secret, issuer, token_ttl),
            passwords,
            dummy_hash,
        })
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        self.passwords.hash(password)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        self.passwords.verify(password, hash)
    }

    /// Burns the same work as a real verification without any account.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.passwords.verify(password, &self.dummy_hash);
    }

    pub fn issue_token(
        &self,
        subject: UserId,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<IssuedToken> {
        let (token, claims) = self.tokens.create_token(subject, name, email, role)?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| anyhow::anyhow!("Token expiry out of range"))?;

        Ok(IssuedToken {
            token,
            identity: Identity {
                subject,
                name: claims.name,
                email: claims.email,
                role,
                expires_at,
            },
        })
    }

    /// Checks signature, algorithm, issuer and expiry.
    ///
    /// Every failure collapses into `AuthError::Unauthenticated`; the cause
    /// is only visible at debug level.
    pub fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.verify_token(token).map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthError::Unauthenticated
        })?;

        let subject = UserId::parse(&claims.sub).map_err(|_| {
            debug!("token subject is not a user id");
            AuthError::Unauthenticated
        })?;

        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::Unauthenticated)?;

        Ok(Identity {
            subject,
            name: claims.name,
            email: claims.email,
            role: claims.role,
            expires_at,
        })
    }
}
