/// Task comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (task_id, user_id, text) VALUES ($1, $2, $3) \
             RETURNING id, task_id, user_id, text, created_at",
        )
        .bind(task_id)
        .bind(user_id)
        .bind(text.trim())
        .fetch_one(pool)
        .await
    }

    /// Comments on a task, oldest first
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, task_id, user_id, text, created_at FROM comments \
             WHERE task_id = $1 ORDER BY created_at ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}
