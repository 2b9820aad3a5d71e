/// Password hashing and password rules
///
/// Hashes use Argon2id with the parameters encoded into the PHC string, so
/// verification keeps working if the cost parameters change later.
///
/// # Parameters
///
/// - **Memory**: 19 MiB (19456 KiB)
/// - **Iterations**: 2
/// - **Parallelism**: 1
///
/// # Example
///
/// ```
/// use planboard_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Tr0ub4dor&3")?;
/// assert!(verify_password("Tr0ub4dor&3", &hash)?);
/// assert!(!verify_password("tr0ub4dor&3", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, ParamsBuilder, Version,
};
use rand::seq::SliceRandom;
use std::sync::OnceLock;

use super::token::random_string;

/// Minimum password length (characters)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (characters)
pub const MAX_PASSWORD_LENGTH: usize = 128;

const TEMP_PASSWORD_LENGTH: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// Password doesn't meet the strength rules; the message is user-facing
    #[error("{0}")]
    Weak(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(19456)
        .t_cost(2)
        .p_cost(1)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Checks a password against a stored PHC hash
///
/// Returns `Ok(false)` for a wrong password and `Err` only when the stored
/// hash itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Runs a full Argon2 verification against a throwaway hash
///
/// Used on sign-in when no account matches, so an unknown login costs the
/// same as a wrong password.
pub fn verify_dummy(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let hash = DUMMY_HASH.get_or_init(|| hash_password(&random_string(24)).ok());
    if let Some(hash) = hash {
        let _ = verify_password(password, hash);
    }
}

/// Enforces the password rules
///
/// 8 to 128 characters with at least one uppercase letter, one lowercase
/// letter, one digit and one symbol.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    let length = password.chars().count();

    let problem = if length < MIN_PASSWORD_LENGTH {
        Some(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ))
    } else if length > MAX_PASSWORD_LENGTH {
        Some(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        ))
    } else if !password.chars().any(char::is_uppercase) {
        Some("Password must contain at least one uppercase letter".to_string())
    } else if !password.chars().any(char::is_lowercase) {
        Some("Password must contain at least one lowercase letter".to_string())
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        Some("Password must contain at least one digit".to_string())
    } else if password.chars().all(char::is_alphanumeric) {
        Some("Password must contain at least one special character".to_string())
    } else {
        None
    };

    match problem {
        Some(message) => Err(PasswordError::Weak(message)),
        None => Ok(()),
    }
}

/// Generates a temporary password for accounts created by an admin
///
/// The result always satisfies [`validate_password_strength`]. The account
/// is flagged `needs_password_change` so the user picks their own.
pub fn generate_temporary_password() -> String {
    const SYMBOLS: &[u8] = b"!@#$%^&*-_=+";
    let mut rng = rand::thread_rng();

    let mut chars: Vec<char> = random_string(TEMP_PASSWORD_LENGTH - 4).chars().collect();
    chars.push(*b"ABCDEFGHJKLMNPQRSTUVWXYZ".choose(&mut rng).unwrap_or(&b'A') as char);
    chars.push(*b"abcdefghijkmnopqrstuvwxyz".choose(&mut rng).unwrap_or(&b'a') as char);
    chars.push(*b"23456789".choose(&mut rng).unwrap_or(&b'7') as char);
    chars.push(*SYMBOLS.choose(&mut rng).unwrap_or(&b'!') as char);
    chars.shuffle(&mut rng);

    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("Secret#123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=19456"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_hash_password_uses_fresh_salt() {
        let hash1 = hash_password("same_password").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password").expect("Hash 2 should succeed");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password").expect("Hash should succeed");

        assert!(verify_password("correct_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_unicode() {
        let hash = hash_password("unicode-密码-パスワード").expect("Hash should succeed");
        assert!(verify_password("unicode-密码-パスワード", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(matches!(
            verify_password("password", "invalid_hash"),
            Err(PasswordError::InvalidHash(_))
        ));
        assert!(verify_password("password", "$argon2id$invalid").is_err());
    }

    #[test]
    fn test_verify_dummy_runs_real_check() {
        let started = std::time::Instant::now();
        verify_dummy("whatever");
        verify_dummy("whatever");
        // Two Argon2 verifications plus the one-off hash are never instant
        assert!(started.elapsed() > std::time::Duration::from_millis(1));
    }

    #[test]
    fn test_strength_accepts_good_passwords() {
        for password in ["MyP@ssw0rd!", "Str0ng!Pass", "C0mpl3x#Pwd", "S3cur3$Password"] {
            assert!(
                validate_password_strength(password).is_ok(),
                "Password '{}' should be valid",
                password
            );
        }
    }

    #[test]
    fn test_strength_rejections() {
        let cases = [
            ("Sh0rt!", "at least 8 characters"),
            ("lowercase1!", "uppercase letter"),
            ("UPPERCASE1!", "lowercase letter"),
            ("NoDigits!!", "digit"),
            ("NoSpecial123", "special character"),
        ];

        for (password, expected) in cases {
            match validate_password_strength(password) {
                Err(PasswordError::Weak(message)) => assert!(
                    message.contains(expected),
                    "'{}' should fail with '{}', got '{}'",
                    password,
                    expected,
                    message
                ),
                other => panic!("'{}' should be weak, got {:?}", password, other),
            }
        }

        let too_long = format!("Aa1!{}", "x".repeat(MAX_PASSWORD_LENGTH));
        assert!(validate_password_strength(&too_long).is_err());
    }

    #[test]
    fn test_temporary_password_is_strong() {
        for _ in 0..50 {
            let password = generate_temporary_password();
            assert_eq!(password.chars().count(), TEMP_PASSWORD_LENGTH);
            assert!(
                validate_password_strength(&password).is_ok(),
                "generated '{}' should be strong",
                password
            );
        }
    }
}
