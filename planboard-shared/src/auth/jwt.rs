/// JWT access and refresh tokens
///
/// Tokens are HS256-signed with the server secret and carry the user's id,
/// email and role, so permission checks don't need a database round trip on
/// every request.
///
/// # Token Types
///
/// - **Access**: short-lived (default 15 minutes), sent as a Bearer header
///   or the `accessToken` cookie
/// - **Refresh**: long-lived (default 7 days), only accepted by
///   `POST /auth/refresh-token`
///
/// # Example
///
/// ```
/// use planboard_shared::auth::jwt::{TokenIssuer, TokenType};
/// use planboard_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let issuer = TokenIssuer::new("a-secret-that-is-at-least-32-bytes!");
/// let user_id = Uuid::new_v4();
///
/// let pair = issuer.issue_pair(user_id, "dev@example.com", UserRole::Developer).unwrap();
/// let claims = issuer.validate_access(&pair.access_token).unwrap();
/// assert_eq!(claims.sub, user_id);
/// assert_eq!(claims.token_type, TokenType::Access);
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Value of the `iss` claim
pub const ISSUER: &str = "planboard";

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer")]
    InvalidIssuer,

    #[error("Expected {expected} token, got {actual} token")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Claims carried by every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,

    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,

    pub email: String,

    /// Role at the time the token was issued
    pub role: UserRole,

    pub token_type: TokenType,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        role: UserRole,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            email: email.into(),
            role,
            token_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Seconds left before expiry, None once expired
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// An access token together with its refresh token
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Signs and validates tokens with one secret and fixed lifetimes
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Issuer with the default lifetimes (15 minutes / 7 days)
    pub fn new(secret: &str) -> Self {
        Self::with_ttls(secret, Duration::minutes(15), Duration::days(7))
    }

    pub fn with_ttls(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    pub fn access_token(&self, user_id: Uuid, email: &str, role: UserRole) -> Result<String, JwtError> {
        self.sign(&Claims::new(user_id, email, role, TokenType::Access, self.access_ttl))
    }

    pub fn issue_pair(&self, user_id: Uuid, email: &str, role: UserRole) -> Result<TokenPair, JwtError> {
        let access_token = self.access_token(user_id, email, role)?;
        let refresh_token = self.sign(&Claims::new(
            user_id,
            email,
            role,
            TokenType::Refresh,
            self.refresh_ttl,
        ))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Verifies signature, issuer, `exp` and `nbf`
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
                _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
            })
    }

    fn validate_type(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let claims = self.validate(token)?;

        if claims.token_type != expected {
            return Err(JwtError::WrongType {
                expected: expected.as_str(),
                actual: claims.token_type.as_str(),
            });
        }

        Ok(claims)
    }

    pub fn validate_access(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_type(token, TokenType::Access)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_type(token, TokenType::Refresh)
    }

    /// Exchanges a refresh token for a new access token with the same subject and role
    pub fn refresh_access_token(&self, refresh_token: &str) -> Result<String, JwtError> {
        let claims = self.validate_refresh(refresh_token)?;
        self.access_token(claims.sub, &claims.email, claims.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET)
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(
            user_id,
            "pm@example.com",
            UserRole::Manager,
            TokenType::Access,
            Duration::hours(1),
        );

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.role, UserRole::Manager);
        assert!(!claims.is_expired());

        let time_left = claims.time_until_expiration().unwrap();
        assert!(time_left.num_seconds() > 3500);
        assert!(time_left.num_seconds() <= 3600);
    }

    #[test]
    fn test_issue_and_validate_pair() {
        let user_id = Uuid::new_v4();
        let pair = issuer()
            .issue_pair(user_id, "dev@example.com", UserRole::Developer)
            .unwrap();

        assert_eq!(pair.expires_in, 15 * 60);

        let access = issuer().validate_access(&pair.access_token).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(access.email, "dev@example.com");
        assert_eq!(access.role, UserRole::Developer);

        let refresh = issuer().validate_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, user_id);
        assert_eq!(refresh.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let pair = issuer()
            .issue_pair(Uuid::new_v4(), "a@example.com", UserRole::Admin)
            .unwrap();

        let other = TokenIssuer::new("another-secret-key-at-least-32-bytes");
        assert!(matches!(
            other.validate(&pair.access_token),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "a@example.com",
            UserRole::Developer,
            TokenType::Access,
            Duration::seconds(-3600),
        );
        assert!(claims.is_expired());
        assert!(claims.time_until_expiration().is_none());

        let token = issuer().sign(&claims).unwrap();
        assert!(matches!(issuer().validate(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let mut claims = Claims::new(
            Uuid::new_v4(),
            "a@example.com",
            UserRole::Developer,
            TokenType::Access,
            Duration::hours(1),
        );
        claims.iss = "someone-else".to_string();

        let token = issuer().sign(&claims).unwrap();
        assert!(matches!(issuer().validate(&token), Err(JwtError::InvalidIssuer)));
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let pair = issuer()
            .issue_pair(Uuid::new_v4(), "a@example.com", UserRole::Developer)
            .unwrap();

        assert!(matches!(
            issuer().validate_access(&pair.refresh_token),
            Err(JwtError::WrongType { expected: "access", actual: "refresh" })
        ));
        assert!(matches!(
            issuer().validate_refresh(&pair.access_token),
            Err(JwtError::WrongType { expected: "refresh", actual: "access" })
        ));
    }

    #[test]
    fn test_refresh_access_token() {
        let user_id = Uuid::new_v4();
        let pair = issuer()
            .issue_pair(user_id, "sa@example.com", UserRole::SuperAdmin)
            .unwrap();

        let new_access = issuer().refresh_access_token(&pair.refresh_token).unwrap();
        let claims = issuer().validate_access(&new_access).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::SuperAdmin);
        assert_eq!(claims.token_type, TokenType::Access);

        assert!(issuer().refresh_access_token(&pair.access_token).is_err());
    }

    #[test]
    fn test_custom_ttls() {
        let issuer = TokenIssuer::with_ttls(SECRET, Duration::minutes(5), Duration::days(1));
        assert_eq!(issuer.access_ttl(), Duration::minutes(5));
        assert_eq!(issuer.refresh_ttl(), Duration::days(1));

        let pair = issuer
            .issue_pair(Uuid::new_v4(), "a@example.com", UserRole::Developer)
            .unwrap();
        assert_eq!(pair.expires_in, 300);
    }
}
