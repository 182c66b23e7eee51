use thiserror::Error;

/// Gate failures.
///
/// Display strings are deliberately fixed: callers learn whether to log in
/// again or that they are not allowed, never which check failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Missing, malformed, expired or wrongly signed credential.
    #[error("unauthorized")]
    Unauthenticated,

    /// Valid identity without the required capability or ownership.
    #[error("forbidden")]
    Forbidden,
}
