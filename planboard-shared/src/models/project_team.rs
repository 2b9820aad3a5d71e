/// Project ↔ team links

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTeam {
    pub project_id: Uuid,
    pub team_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ProjectTeam {
    /// Links a team to a project; linking twice returns the existing link
    pub async fn link(pool: &PgPool, project_id: Uuid, team_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectTeam>(
            "INSERT INTO project_teams (project_id, team_id) VALUES ($1, $2) \
             ON CONFLICT (project_id, team_id) DO UPDATE SET project_id = EXCLUDED.project_id \
             RETURNING project_id, team_id, created_at",
        )
        .bind(project_id)
        .bind(team_id)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectTeam>(
            "SELECT project_id, team_id, created_at FROM project_teams \
             WHERE project_id = $1 ORDER BY created_at ASC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectTeam>(
            "SELECT project_id, team_id, created_at FROM project_teams ORDER BY project_id, created_at",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn unlink(pool: &PgPool, project_id: Uuid, team_id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_teams WHERE project_id = $1 AND team_id = $2")
                .bind(project_id)
                .bind(team_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
