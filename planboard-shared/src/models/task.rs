/// Task model and database operations
///
/// A task is a unit of work inside a project. The board groups tasks into
/// one column per status; dropping a card in another column is a single
/// status update.
///
/// # Board columns
///
/// ```text
/// TO_DO ⇄ WORK_IN_PROGRESS ⇄ UNDER_REVIEW ⇄ COMPLETED
/// ```
///
/// Any column may move to any other; there is no enforced workflow.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('to_do', 'work_in_progress', 'under_review', 'completed');
/// CREATE TYPE task_priority AS ENUM ('urgent', 'high', 'medium', 'low', 'backlog');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'to_do',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     start_date DATE,
///     due_date DATE,
///     points INTEGER,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     author_id UUID NOT NULL REFERENCES users(id),
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use planboard_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus};
/// use planboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     title: "Wire up sign-in form".to_string(),
///     description: None,
///     status: TaskStatus::ToDo,
///     priority: TaskPriority::High,
///     tags: vec!["frontend".to_string()],
///     start_date: None,
///     due_date: None,
///     points: Some(3),
///     project_id: Uuid::new_v4(),
///     author_id: Uuid::new_v4(),
///     assignee_id: None,
/// }).await?;
///
/// // Card dropped in the review column
/// Task::update_status(&pool, task.id, TaskStatus::UnderReview).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::pagination::ListParams;

const TASK_COLUMNS: &str = "id, title, description, status, priority, tags, start_date, due_date, \
     points, project_id, author_id, assignee_id, created_at, updated_at";

/// Board column of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    ToDo,
    WorkInProgress,
    UnderReview,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to_do",
            TaskStatus::WorkInProgress => "work_in_progress",
            TaskStatus::UnderReview => "under_review",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task priority, most to least pressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
pub enum TaskPriority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
    Backlog,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Urgent => "urgent",
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
            TaskPriority::Backlog => "backlog",
        }
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,

    /// Story points
    pub points: Option<i32>,

    pub project_id: Uuid,
    pub author_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub points: Option<i32>,
    pub project_id: Uuid,
    pub author_id: Uuid,
    pub assignee_id: Option<Uuid>,
}

/// Input for updating a task; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub tags: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub points: Option<i32>,
    pub assignee_id: Option<Uuid>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
            && self.start_date.is_none()
            && self.due_date.is_none()
            && self.points.is_none()
            && self.assignee_id.is_none()
    }
}

/// Filters for `GET /tasks`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
}

/// Tasks per status or priority, for dashboard charts
#[derive(Debug, Clone, Serialize)]
pub struct TaskCount<K> {
    pub key: K,
    pub count: i64,
}

impl Task {
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (title, description, status, priority, tags, start_date, due_date, \
             points, project_id, author_id, assignee_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.tags)
            .bind(data.start_date)
            .bind(data.due_date)
            .bind(data.points)
            .bind(data.project_id)
            .bind(data.author_id)
            .bind(data.assignee_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Updates the given fields and bumps `updated_at`
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        let mut push = |column: &str, present: bool, query: &mut String| {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        };

        push("title", data.title.is_some(), &mut query);
        push("description", data.description.is_some(), &mut query);
        push("status", data.status.is_some(), &mut query);
        push("priority", data.priority.is_some(), &mut query);
        push("tags", data.tags.is_some(), &mut query);
        push("start_date", data.start_date.is_some(), &mut query);
        push("due_date", data.due_date.is_some(), &mut query);
        push("points", data.points.is_some(), &mut query);
        push("assignee_id", data.assignee_id.is_some(), &mut query);

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", TASK_COLUMNS));

        // Binds must follow the same order as the columns above
        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(points) = data.points {
            q = q.bind(points);
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }

        q.fetch_optional(pool).await
    }

    /// Moves a task to another board column
    ///
    /// Moving to the column it is already in leaves the row untouched and
    /// returns it as-is.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status <> $2 \
             RETURNING {}",
            TASK_COLUMNS
        );

        let moved = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await?;

        match moved {
            Some(task) => Ok(Some(task)),
            None => Self::find_by_id(pool, id).await,
        }
    }

    fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a TaskFilter) {
        builder.push(" WHERE TRUE");

        if let Some(project_id) = filter.project_id {
            builder.push(" AND project_id = ");
            builder.push_bind(project_id);
        }
        if let Some(priority) = filter.priority {
            builder.push(" AND priority = ");
            builder.push_bind(priority);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }
        if let Some(assignee_id) = filter.assignee_id {
            builder.push(" AND assignee_id = ");
            builder.push_bind(assignee_id);
        }
    }

    /// Lists tasks matching `filter`, one page at a time
    pub async fn list(
        pool: &PgPool,
        filter: &TaskFilter,
        params: &ListParams,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let sort_column = params.sort_column(
            &[
                ("title", "title"),
                ("status", "status"),
                ("priority", "priority"),
                ("startDate", "start_date"),
                ("dueDate", "due_date"),
                ("points", "points"),
                ("createdAt", "created_at"),
                ("updatedAt", "updated_at"),
            ],
            "created_at",
        );

        let mut builder = QueryBuilder::new(format!("SELECT {} FROM tasks", TASK_COLUMNS));
        Self::push_filters(&mut builder, filter);
        builder.push(format!(
            " ORDER BY {} {} LIMIT ",
            sort_column,
            params.sort_order().as_sql()
        ));
        builder.push_bind(params.limit());
        builder.push(" OFFSET ");
        builder.push_bind(params.offset());

        let tasks = builder.build_query_as::<Task>().fetch_all(pool).await?;

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
        Self::push_filters(&mut count_builder, filter);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await?;

        Ok((tasks, total))
    }

    /// Tasks the user authored or is assigned to, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks \
             WHERE author_id = $1 OR assignee_id = $1 \
             ORDER BY created_at DESC",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Tasks whose title or description contains `term`
    pub async fn search(pool: &PgPool, term: &str, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks \
             WHERE title ILIKE $1 ESCAPE '\\' OR description ILIKE $1 ESCAPE '\\' \
             ORDER BY updated_at DESC LIMIT $2",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(super::contains_pattern(term))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<TaskCount<TaskStatus>>, sqlx::Error> {
        let rows: Vec<(TaskStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM tasks GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(key, count)| TaskCount { key, count })
            .collect())
    }

    pub async fn count_by_priority(
        pool: &PgPool,
    ) -> Result<Vec<TaskCount<TaskPriority>>, sqlx::Error> {
        let rows: Vec<(TaskPriority, i64)> = sqlx::query_as(
            "SELECT priority, COUNT(*) FROM tasks GROUP BY priority ORDER BY priority",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(key, count)| TaskCount { key, count })
            .collect())
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await
    }

    /// Deletes a task along with its comments and attachments
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// True if the user wrote or is assigned to this task
    pub fn is_involved(&self, user_id: Uuid) -> bool {
        self.author_id == user_id || self.assignee_id == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Ship board view".to_string(),
            description: None,
            status: TaskStatus::ToDo,
            priority: TaskPriority::Medium,
            tags: vec![],
            start_date: None,
            due_date: None,
            points: None,
            project_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            assignee_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::WorkInProgress).unwrap(),
            "\"WORK_IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"TO_DO\"").unwrap(),
            TaskStatus::ToDo
        );
        assert!(serde_json::from_str::<TaskStatus>("\"DONE\"").is_err());
    }

    #[test]
    fn test_priority_wire_format() {
        assert_eq!(serde_json::to_string(&TaskPriority::Backlog).unwrap(), "\"Backlog\"");
        assert_eq!(
            serde_json::from_str::<TaskPriority>("\"Urgent\"").unwrap(),
            TaskPriority::Urgent
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::ToDo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_update_task_is_empty() {
        assert!(UpdateTask::default().is_empty());

        let update = UpdateTask {
            points: Some(5),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_is_involved() {
        let mut task = sample_task();
        let assignee = Uuid::new_v4();
        task.assignee_id = Some(assignee);

        assert!(task.is_involved(task.author_id));
        assert!(task.is_involved(assignee));
        assert!(!task.is_involved(Uuid::new_v4()));
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let task = sample_task();
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("projectId").is_some());
        assert!(json.get("assigneeId").is_some());
        assert_eq!(json["status"], "TO_DO");
    }
}
