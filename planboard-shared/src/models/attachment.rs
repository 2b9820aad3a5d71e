/// Task attachments
///
/// Files are uploaded by the client to an external image host; only the
/// resulting URL is stored here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const ATTACHMENT_COLUMNS: &str = "id, task_id, uploaded_by, file_url, file_name, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub uploaded_by: Uuid,
    pub file_url: String,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAttachment {
    pub task_id: Uuid,
    pub uploaded_by: Uuid,
    pub file_url: String,
    pub file_name: Option<String>,
}

impl Attachment {
    pub async fn create(pool: &PgPool, data: CreateAttachment) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO attachments (task_id, uploaded_by, file_url, file_name) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            ATTACHMENT_COLUMNS
        );

        sqlx::query_as::<_, Attachment>(&query)
            .bind(data.task_id)
            .bind(data.uploaded_by)
            .bind(data.file_url)
            .bind(data.file_name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM attachments WHERE id = $1", ATTACHMENT_COLUMNS);

        sqlx::query_as::<_, Attachment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM attachments WHERE task_id = $1 ORDER BY created_at ASC",
            ATTACHMENT_COLUMNS
        );

        sqlx::query_as::<_, Attachment>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
