use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// The identity handed to every booking, payment and review operation by the
/// authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this user may read a record owned by `owner`.
    pub fn can_access(&self, owner: Uuid) -> bool {
        self.id == owner || self.is_admin()
    }
}

/// Turns a missing identity into `Unauthorized`.
pub fn require_user(user: Option<&AuthenticatedUser>) -> CoreResult<&AuthenticatedUser> {
    user.ok_or(CoreError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            email: "hiker@example.com".into(),
            display_name: "Hiker".into(),
            role,
        }
    }

    #[test]
    fn test_only_owner_or_admin_can_access() {
        let owner = user(Role::User);
        let stranger = user(Role::User);
        let admin = user(Role::Admin);

        assert!(owner.can_access(owner.id));
        assert!(!stranger.can_access(owner.id));
        assert!(admin.can_access(owner.id));
    }

    #[test]
    fn test_missing_identity_is_unauthorized() {
        assert!(matches!(require_user(None), Err(CoreError::Unauthorized)));
    }
}
