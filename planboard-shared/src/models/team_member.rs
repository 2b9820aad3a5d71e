/// Team membership
///
/// Composite key `(team_id, user_id)`: a user is in a team at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

impl TeamMember {
    /// Adds a user to a team
    ///
    /// Adding an existing member is a no-op that returns the existing row.
    pub async fn add<'e, E>(executor: E, team_id: Uuid, user_id: Uuid) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TeamMember>(
            "INSERT INTO team_members (team_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (team_id, user_id) DO UPDATE SET team_id = EXCLUDED.team_id \
             RETURNING team_id, user_id, joined_at",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            "SELECT team_id, user_id, joined_at FROM team_members WHERE team_id = $1 AND user_id = $2",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            "SELECT team_id, user_id, joined_at FROM team_members \
             WHERE team_id = $1 ORDER BY joined_at ASC",
        )
        .bind(team_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            "SELECT team_id, user_id, joined_at FROM team_members ORDER BY team_id, joined_at",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn remove(pool: &PgPool, team_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
