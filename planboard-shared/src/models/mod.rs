/// Database models for Planboard
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, roles and account status
/// - `profile`: Display details per user, and the role-filtered member views
/// - `project`: Projects owning tasks
/// - `task`: Tasks, board columns and priorities
/// - `comment`, `attachment`: Discussion and files on a task
/// - `team`, `team_member`, `project_team`: Teams and their links
/// - `auth_token`: Single-use email verification and password reset tokens
///
/// # Example
///
/// ```no_run
/// use planboard_shared::models::user::{CreateUser, User, UserRole};
/// use planboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "dev@example.com".to_string(),
///     username: "dev".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Developer,
///     email_verified: false,
///     needs_password_change: false,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod attachment;
pub mod auth_token;
pub mod comment;
pub mod profile;
pub mod project;
pub mod project_team;
pub mod task;
pub mod team;
pub mod team_member;
pub mod user;

/// `ILIKE` pattern that matches `term` as a literal substring
///
/// `%`, `_` and `\` in the term are escaped; queries pair it with
/// `ESCAPE '\'`.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(" login "), "%login%");
        assert_eq!(contains_pattern("_"), "%\\_%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
