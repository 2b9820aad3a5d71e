/// User model and database operations
///
/// A user is an account that can sign in. Its `role` decides what it may do
/// across the dashboard; display details live in the matching `profiles` row.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('developer', 'manager', 'admin', 'super_admin');
/// CREATE TYPE user_status AS ENUM ('active', 'blocked', 'deleted');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL,            -- unique on LOWER(email)
///     username VARCHAR(64) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'developer',
///     status user_status NOT NULL DEFAULT 'active',
///     email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     needs_password_change BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::pagination::ListParams;

const USER_COLUMNS: &str = "id, email, username, password_hash, role, status, email_verified, \
     needs_password_change, created_at, updated_at, last_login_at";

/// Dashboard roles, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Works on tasks
    Developer,

    /// Runs projects and teams
    Manager,

    /// Administers users below admin
    Admin,

    /// Unrestricted
    SuperAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Developer => "developer",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "super_admin",
        }
    }

    /// Numeric level for comparisons
    ///
    /// Hierarchy: SuperAdmin > Admin > Manager > Developer
    fn permission_level(&self) -> u8 {
        match self {
            UserRole::SuperAdmin => 4,
            UserRole::Admin => 3,
            UserRole::Manager => 2,
            UserRole::Developer => 1,
        }
    }

    /// True if this role is at least `required`
    pub fn has_permission(&self, required: &UserRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    /// Whether a user with this role may create an account with `target` role
    ///
    /// SuperAdmin creates anyone; everyone else only creates roles below their own.
    pub fn can_create(&self, target: &UserRole) -> bool {
        match self {
            UserRole::SuperAdmin => true,
            UserRole::Developer => false,
            _ => self.permission_level() > target.permission_level(),
        }
    }

    /// Whether a user with this role may block, delete or edit a user with `target` role
    pub fn can_manage(&self, target: &UserRole) -> bool {
        match self {
            UserRole::SuperAdmin => true,
            _ => self.permission_level() > target.permission_level(),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    /// Accepts both the database spelling (`super_admin`) and the wire spelling (`SUPER_ADMIN`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "developer" => Ok(UserRole::Developer),
            "manager" => Ok(UserRole::Manager),
            "admin" => Ok(UserRole::Admin),
            "super_admin" | "superadmin" | "super-admin" => Ok(UserRole::SuperAdmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Blocked,
    Deleted,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Blocked => "blocked",
            UserStatus::Deleted => "deleted",
        }
    }

    /// Only active accounts may sign in
    pub fn can_sign_in(&self) -> bool {
        matches!(self, UserStatus::Active)
    }
}

/// User account
///
/// Passwords are stored as Argon2id hashes only.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Stored lowercase; unique case-insensitively
    pub email: String,

    pub username: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,

    pub status: UserStatus,

    pub email_verified: bool,

    /// Set when an admin created the account with a temporary password
    pub needs_password_change: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub username: String,

    /// Argon2id hash, never the plaintext password
    pub password_hash: String,

    pub role: UserRole,

    pub email_verified: bool,
    pub needs_password_change: bool,
}

/// Input for updating a user; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub status: Option<UserStatus>,
    pub email_verified: Option<bool>,
    pub needs_password_change: Option<bool>,
}

/// Filters for `GET /users`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    /// Case-insensitive match on email or username
    pub search_term: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

/// Normalizes an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Inserts a user
    ///
    /// Accepts a pool or a transaction so the user and its profile can be
    /// written atomically.
    ///
    /// # Errors
    ///
    /// Unique violations on `users_email_key` / `users_username_key` when the
    /// email or username is taken.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO users (email, username, password_hash, role, email_verified, needs_password_change) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(&data.email))
            .bind(data.username.trim())
            .bind(data.password_hash)
            .bind(data.role)
            .bind(data.email_verified)
            .bind(data.needs_password_change)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE LOWER(email) = $1",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Lookup by email or username, for the sign-in form
    ///
    /// An email match wins over a username that happens to equal it.
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE LOWER(email) = $1 OR username = $2 \
             ORDER BY (LOWER(email) = $1) DESC LIMIT 1",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(login))
            .bind(login.trim())
            .fetch_optional(pool)
            .await
    }

    /// Updates the given fields and bumps `updated_at`
    ///
    /// Returns None if the user doesn't exist.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.email_verified.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email_verified = ${}", bind_count));
        }
        if data.needs_password_change.is_some() {
            bind_count += 1;
            query.push_str(&format!(", needs_password_change = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", USER_COLUMNS));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(normalize_email(&email));
        }
        if let Some(username) = data.username {
            q = q.bind(username.trim().to_string());
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(verified) = data.email_verified {
            q = q.bind(verified);
        }
        if let Some(needs_change) = data.needs_password_change {
            q = q.bind(needs_change);
        }

        q.fetch_optional(executor).await
    }

    /// Sets the account status
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: UserStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        Self::update(
            pool,
            id,
            UpdateUser {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Soft-deletes a user
    ///
    /// The row stays so tasks and comments keep their author; the account can
    /// no longer sign in.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET status = 'deleted', updated_at = NOW() WHERE id = $1 AND status <> 'deleted'",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes a user row (tests and cleanup only)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a UserFilter) {
        builder.push(" WHERE status <> 'deleted'");

        if let Some(term) = filter.search_term.as_deref().filter(|t| !t.trim().is_empty()) {
            let pattern = super::contains_pattern(term);
            builder.push(" AND (email ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR username ILIKE ");
            builder.push_bind(pattern);
            builder.push(" ESCAPE '\\')");
        }
        if let Some(role) = filter.role {
            builder.push(" AND role = ");
            builder.push_bind(role);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }
    }

    /// Lists users matching `filter`, excluding soft-deleted accounts
    pub async fn list(
        pool: &PgPool,
        filter: &UserFilter,
        params: &ListParams,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let sort_column = params.sort_column(
            &[
                ("email", "email"),
                ("username", "username"),
                ("role", "role"),
                ("createdAt", "created_at"),
            ],
            "created_at",
        );

        let mut builder = QueryBuilder::new(format!("SELECT {} FROM users", USER_COLUMNS));
        Self::push_filters(&mut builder, filter);
        builder.push(format!(
            " ORDER BY {} {} LIMIT ",
            sort_column,
            params.sort_order().as_sql()
        ));
        builder.push_bind(params.limit());
        builder.push(" OFFSET ");
        builder.push_bind(params.offset());

        let users = builder.build_query_as::<User>().fetch_all(pool).await?;

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM users");
        Self::push_filters(&mut count_builder, filter);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await?;

        Ok((users, total))
    }

    /// Active users whose email or username contains `term`
    pub async fn search(pool: &PgPool, term: &str, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users \
             WHERE status = 'active' AND (email ILIKE $1 ESCAPE '\\' OR username ILIKE $1 ESCAPE '\\') \
             ORDER BY username ASC LIMIT $2",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(super::contains_pattern(term))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Counts users that are not soft-deleted
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE status <> 'deleted'")
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(UserRole::SuperAdmin.has_permission(&UserRole::Admin));
        assert!(UserRole::Admin.has_permission(&UserRole::Manager));
        assert!(UserRole::Manager.has_permission(&UserRole::Manager));
        assert!(!UserRole::Developer.has_permission(&UserRole::Manager));
    }

    #[test]
    fn test_role_creation_matrix() {
        use UserRole::*;

        for target in [Developer, Manager, Admin, SuperAdmin] {
            assert!(SuperAdmin.can_create(&target));
            assert!(!Developer.can_create(&target));
        }

        assert!(Admin.can_create(&Manager));
        assert!(Admin.can_create(&Developer));
        assert!(!Admin.can_create(&Admin));
        assert!(!Admin.can_create(&SuperAdmin));

        assert!(Manager.can_create(&Developer));
        assert!(!Manager.can_create(&Manager));
    }

    #[test]
    fn test_role_management_matrix() {
        use UserRole::*;

        assert!(SuperAdmin.can_manage(&SuperAdmin));
        assert!(Admin.can_manage(&Manager));
        assert!(!Admin.can_manage(&Admin));
        assert!(Manager.can_manage(&Developer));
        assert!(!Developer.can_manage(&Developer));
    }


    #[test]
    fn test_role_parsing() {
        assert_eq!("SUPER_ADMIN".parse::<UserRole>().unwrap(), UserRole::SuperAdmin);
        assert_eq!("super-admin".parse::<UserRole>().unwrap(), UserRole::SuperAdmin);
        assert_eq!("Manager".parse::<UserRole>().unwrap(), UserRole::Manager);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(
            serde_json::to_string(&UserRole::SuperAdmin).unwrap(),
            "\"SUPER_ADMIN\""
        );
        assert_eq!(
            serde_json::from_str::<UserRole>("\"DEVELOPER\"").unwrap(),
            UserRole::Developer
        );
    }

    #[test]
    fn test_status_sign_in() {
        assert!(UserStatus::Active.can_sign_in());
        assert!(!UserStatus::Blocked.can_sign_in());
        assert!(!UserStatus::Deleted.can_sign_in());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }

    #[test]
    fn test_update_user_default() {
        let update = UpdateUser::default();
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.status.is_none());
    }
}
