/// Team model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     product_owner_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     project_manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::pagination::ListParams;

const TEAM_COLUMNS: &str =
    "id, name, product_owner_id, project_manager_id, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,

    /// Unique across the workspace
    pub name: String,

    pub product_owner_id: Option<Uuid>,
    pub project_manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub name: String,
    pub product_owner_id: Option<Uuid>,
    pub project_manager_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTeam {
    pub name: Option<String>,
    pub product_owner_id: Option<Uuid>,
    pub project_manager_id: Option<Uuid>,
}

impl Team {
    /// Inserts a team
    ///
    /// # Errors
    ///
    /// Unique violation on `teams_name_key` when the name is taken.
    pub async fn create<'e, E>(executor: E, data: CreateTeam) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO teams (name, product_owner_id, project_manager_id) \
             VALUES ($1, $2, $3) \
             RETURNING {}",
            TEAM_COLUMNS
        );

        sqlx::query_as::<_, Team>(&query)
            .bind(data.name.trim())
            .bind(data.product_owner_id)
            .bind(data.project_manager_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM teams WHERE id = $1", TEAM_COLUMNS);

        sqlx::query_as::<_, Team>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, params: &ListParams) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let sort_column = params.sort_column(
            &[("name", "name"), ("createdAt", "created_at")],
            "created_at",
        );

        let query = format!(
            "SELECT {} FROM teams ORDER BY {} {} LIMIT $1 OFFSET $2",
            TEAM_COLUMNS,
            sort_column,
            params.sort_order().as_sql()
        );

        let teams = sqlx::query_as::<_, Team>(&query)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        let total = Self::count(pool).await?;

        Ok((teams, total))
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTeam,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE teams SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.product_owner_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", product_owner_id = ${}", bind_count));
        }
        if data.project_manager_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", project_manager_id = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", TEAM_COLUMNS));

        let mut q = sqlx::query_as::<_, Team>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name.trim().to_string());
        }
        if let Some(product_owner_id) = data.product_owner_id {
            q = q.bind(product_owner_id);
        }
        if let Some(project_manager_id) = data.project_manager_id {
            q = q.bind(project_manager_id);
        }

        q.fetch_optional(pool).await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM teams")
            .fetch_one(pool)
            .await
    }

    /// Deletes a team together with its memberships and project links
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
