use chrono::{DateTime, Utc};

use super::{AuthError, Role};
use crate::common::UserId;

/// The verified caller of a single operation.
///
/// Produced by the authorization gate from a bearer token and handed to
/// actions as an explicit argument. It is never persisted or cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    /// Fails with `Forbidden` unless this identity's role satisfies `role`.
    pub fn require(&self, role: Role) -> Result<(), AuthError> {
        if self.role.satisfies(role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }

    pub fn is(&self, user: UserId) -> bool {
        self.subject == user
    }

    /// The creator filter a list query must apply for this caller.
    ///
    /// Regular users only ever see their own requests.
    pub fn visible_creator(&self, requested: Option<UserId>) -> Option<UserId> {
        if self.is_privileged() {
            requested
        } else {
            Some(self.subject)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            subject: UserId::new(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            role,
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_admin() {
        assert_eq!(
            identity(Role::Regular).require(Role::Admin),
            Err(AuthError::Forbidden)
        );
        assert!(identity(Role::Admin).require(Role::Admin).is_ok());
        assert!(identity(Role::ElevatedAdmin).require(Role::Admin).is_ok());
    }

    #[test]
    fn test_regular_users_are_scoped_to_themselves() {
        let user = identity(Role::Regular);
        assert_eq!(user.visible_creator(None), Some(user.subject));
        assert_eq!(user.visible_creator(Some(UserId::new())), Some(user.subject));
    }

    #[test]
    fn test_admins_see_what_they_ask_for() {
        let admin = identity(Role::Admin);
        let other = UserId::new();
        assert_eq!(admin.visible_creator(None), None);
        assert_eq!(admin.visible_creator(Some(other)), Some(other));
    }
}
