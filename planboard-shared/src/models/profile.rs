/// Profile model and the role-filtered member views
///
/// Each user has exactly one profile holding display details. The
/// `/developers`, `/managers`, `/admins` and `/super-admins` resources are
/// users of that role joined with their profile, see [`Member`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     contact_number VARCHAR(32),
///     address TEXT,
///     profile_image_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::user::{UserRole, UserStatus};
use crate::pagination::ListParams;

const PROFILE_COLUMNS: &str =
    "user_id, first_name, last_name, contact_number, address, profile_image_url, created_at, updated_at";

const MEMBER_SELECT: &str = "SELECT u.id, u.email, u.username, u.role, u.status, u.email_verified, \
     u.needs_password_change, u.created_at, u.last_login_at, \
     p.first_name, p.last_name, p.contact_number, p.address, p.profile_image_url \
     FROM users u LEFT JOIN profiles p ON p.user_id = u.id";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProfile {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub profile_image_url: Option<String>,
}

/// A user joined with its profile
///
/// Profile fields are optional because accounts seeded directly in the
/// database may not have a profile row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub email_verified: bool,
    pub needs_password_change: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub profile_image_url: Option<String>,
}

impl Member {
    /// "First Last", falling back to the username
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            _ => self.username.clone(),
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{} WHERE u.id = $1", MEMBER_SELECT);

        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A user of the given role, or None if the id belongs to another role
    pub async fn find_by_id_and_role(
        pool: &PgPool,
        id: Uuid,
        role: UserRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "{} WHERE u.id = $1 AND u.role = $2 AND u.status <> 'deleted'",
            MEMBER_SELECT
        );

        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .bind(role)
            .fetch_optional(pool)
            .await
    }

    /// Users of one role, excluding soft-deleted accounts
    pub async fn list_by_role(
        pool: &PgPool,
        role: UserRole,
        params: &ListParams,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let sort_column = params.sort_column(
            &[
                ("username", "u.username"),
                ("email", "u.email"),
                ("firstName", "p.first_name"),
                ("lastName", "p.last_name"),
                ("createdAt", "u.created_at"),
            ],
            "u.created_at",
        );

        let query = format!(
            "{} WHERE u.role = $1 AND u.status <> 'deleted' ORDER BY {} {} LIMIT $2 OFFSET $3",
            MEMBER_SELECT,
            sort_column,
            params.sort_order().as_sql()
        );

        let members = sqlx::query_as::<_, Member>(&query)
            .bind(role)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = $1 AND status <> 'deleted'",
        )
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok((members, total))
    }

    /// Members of a team
    pub async fn list_by_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "{} JOIN team_members tm ON tm.user_id = u.id \
             WHERE tm.team_id = $1 AND u.status <> 'deleted' \
             ORDER BY tm.joined_at ASC",
            MEMBER_SELECT
        );

        sqlx::query_as::<_, Member>(&query)
            .bind(team_id)
            .fetch_all(pool)
            .await
    }
}

impl Profile {
    /// Inserts a profile; runs inside the sign-up transaction
    pub async fn create<'e, E>(executor: E, data: CreateProfile) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO profiles (user_id, first_name, last_name, contact_number, address, profile_image_url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            PROFILE_COLUMNS
        );

        sqlx::query_as::<_, Profile>(&query)
            .bind(data.user_id)
            .bind(data.first_name.trim())
            .bind(data.last_name.trim())
            .bind(data.contact_number)
            .bind(data.address)
            .bind(data.profile_image_url)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM profiles WHERE user_id = $1", PROFILE_COLUMNS);

        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Updates the given fields and bumps `updated_at`
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE profiles SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.first_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", first_name = ${}", bind_count));
        }
        if data.last_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_name = ${}", bind_count));
        }
        if data.contact_number.is_some() {
            bind_count += 1;
            query.push_str(&format!(", contact_number = ${}", bind_count));
        }
        if data.address.is_some() {
            bind_count += 1;
            query.push_str(&format!(", address = ${}", bind_count));
        }
        if data.profile_image_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", profile_image_url = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE user_id = $1 RETURNING {}", PROFILE_COLUMNS));

        let mut q = sqlx::query_as::<_, Profile>(&query).bind(user_id);

        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }
        if let Some(contact_number) = data.contact_number {
            q = q.bind(contact_number);
        }
        if let Some(address) = data.address {
            q = q.bind(address);
        }
        if let Some(profile_image_url) = data.profile_image_url {
            q = q.bind(profile_image_url);
        }

        q.fetch_optional(pool).await
    }
}
