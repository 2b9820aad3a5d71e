/// Authentication and authorization primitives
///
/// # Modules
///
/// - [`password`]: Argon2id hashing, strength rules, temporary passwords
/// - [`jwt`]: Access/refresh token issuing and validation
/// - [`token`]: Single-use random tokens for emailed links
/// - [`context`]: The authenticated caller attached to a request
/// - [`authorization`]: Role and ownership checks
///
/// # Example
///
/// ```no_run
/// use planboard_shared::auth::jwt::TokenIssuer;
/// use planboard_shared::auth::password::{hash_password, verify_password};
/// use planboard_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_Passw0rd!")?;
/// assert!(verify_password("user_Passw0rd!", &hash)?);
///
/// let issuer = TokenIssuer::new("secret-key-at-least-32-bytes-long!!");
/// let pair = issuer.issue_pair(Uuid::new_v4(), "dev@example.com", UserRole::Developer)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod context;
pub mod jwt;
pub mod password;
pub mod token;
