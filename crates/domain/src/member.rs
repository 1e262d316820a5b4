use chrono::{DateTime, Utc};
use common::{MemberId, Role};
use serde::{Deserialize, Serialize};

/// A registered member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Soft-delete marker; deleted members fail lookups.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Creates a new active member with the user role.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_role(email, name, Role::User)
    }

    /// Creates a new active member with the given role.
    pub fn with_role(email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: MemberId::new(),
            email: email.into(),
            name: name.into(),
            role,
            deleted: false,
            created_at: Utc::now(),
        }
    }
}
