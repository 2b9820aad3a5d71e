/// Authenticated caller, attached to each request by the auth middleware

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::user::{User, UserRole};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(user_id: Uuid, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }

    /// Context from a freshly loaded user row
    ///
    /// Preferred over [`AuthContext::from_claims`] because the stored role
    /// wins over the one frozen into the token.
    pub fn from_user(user: &User) -> Self {
        Self::new(user.id, user.email.clone(), user.role)
    }

    pub fn from_claims(claims: &Claims) -> Self {
        Self::new(claims.sub, claims.email.clone(), claims.role)
    }

    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn has_role(&self, required: UserRole) -> bool {
        self.role.has_permission(&required)
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
