//! Auth domain - credentials and identity tokens
//!
//! Responsibilities:
//! - Password hashing (argon2id)
//! - Token issuing and verification (HS256 JWT)
//! - Email/password login

pub mod actions;
pub mod edges;
pub mod jwt;
pub mod password;
pub mod verifier;

pub use jwt::{Claims, TokenService};
pub use password::PasswordHashing;
pub use verifier::{CredentialVerifier, IssuedToken};
