//! Explicit request identity.
//!
//! Authentication happens upstream; handlers receive a pre-validated
//! subject and role set and thread it into services as a plain argument.
//! Nothing in this codebase reads identity from ambient state.

use serde::{Deserialize, Serialize};

use crate::MemberId;

/// Role attached to an authenticated subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Parses a role from its wire name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Returns the role name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated subject of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub member_id: MemberId,
    pub roles: Vec<Role>,
}

impl Identity {
    /// Creates an identity for a member with the given roles.
    pub fn new(member_id: MemberId, roles: Vec<Role>) -> Self {
        Self { member_id, roles }
    }

    /// Creates an identity with the plain user role.
    pub fn user(member_id: MemberId) -> Self {
        Self::new(member_id, vec![Role::User])
    }

    /// Creates an identity with the admin role.
    pub fn admin(member_id: MemberId) -> Self {
        Self::new(member_id, vec![Role::Admin])
    }

    /// Returns true if the subject carries the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse(" User "), Some(Role::User));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn has_role_checks_membership() {
        let id = Identity::user(MemberId::new());
        assert!(id.has_role(Role::User));
        assert!(!id.has_role(Role::Admin));
    }

    #[test]
    fn admin_identity_carries_admin_role() {
        let id = Identity::admin(MemberId::new());
        assert!(id.has_role(Role::Admin));
    }
}
