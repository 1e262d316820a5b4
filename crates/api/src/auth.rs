//! Identity extraction from pre-validated request headers.
//!
//! Authentication happens upstream; the gateway attaches the subject and
//! role set as headers. The extractor turns them into an explicit
//! [`Identity`] value that handlers pass down as an argument.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Identity, MemberId, Role};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated member id.
pub const MEMBER_ID_HEADER: &str = "x-member-id";
/// Header carrying the comma-separated role set.
pub const ROLES_HEADER: &str = "x-member-roles";

/// Extractor for the authenticated subject of a request.
pub struct Auth(pub Identity);

impl Auth {
    /// Fails with 403 unless the subject carries the role.
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.0.has_role(role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("{role} role required")))
        }
    }
}

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let member_id = parts
            .headers
            .get(MEMBER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing identity".to_string()))?;

        let member_id = Uuid::parse_str(member_id)
            .map(MemberId::from_uuid)
            .map_err(|e| ApiError::Unauthorized(format!("invalid member id: {e}")))?;

        let roles = match parts.headers.get(ROLES_HEADER).and_then(|v| v.to_str().ok()) {
            Some(raw) => {
                let roles: Vec<Role> = raw.split(',').filter_map(Role::parse).collect();
                if roles.is_empty() {
                    return Err(ApiError::Unauthorized(format!("invalid role set: {raw}")));
                }
                roles
            }
            None => vec![Role::User],
        };

        Ok(Auth(Identity::new(member_id, roles)))
    }
}
