/// One-time tokens for email verification and password reset
///
/// The plaintext token goes into the emailed link; only its SHA-256 hash is
/// stored, so a leaked `auth_tokens` table cannot be replayed.
///
/// # Token Format
///
/// 48 random base62 characters (`[A-Za-z0-9]`), safe to place in a URL
/// without escaping.
///
/// # Example
///
/// ```
/// use planboard_shared::auth::token::{generate_token, hash_token, TOKEN_LENGTH};
///
/// let (token, hash) = generate_token();
/// assert_eq!(token.len(), TOKEN_LENGTH);
/// assert_eq!(hash, hash_token(&token));
/// assert_eq!(hash.len(), 64);
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a generated token (characters)
pub const TOKEN_LENGTH: usize = 48;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a token and its hash
///
/// Returns `(plaintext, sha256_hex)`.
pub fn generate_token() -> (String, String) {
    let token = random_string(TOKEN_LENGTH);
    let hash = hash_token(&token);

    (token, hash)
}

/// Random base62 string from the thread-local CSPRNG
pub fn random_string(length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hex-encoded SHA-256 of a token
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Cheap shape check before touching the database
pub fn is_well_formed(token: &str) -> bool {
    let token = token.trim();
    token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_alphanumeric())
}
