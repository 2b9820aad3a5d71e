/// Task endpoints, including comments and attachments
///
/// # Endpoints
///
/// - `GET    /api/v1/tasks?projectId=&priority=&status=&assigneeId=` - Paginated
/// - `POST   /api/v1/tasks` - Any signed-in user; the caller becomes author
/// - `GET    /api/v1/tasks/:id`
/// - `PATCH  /api/v1/tasks/:id` - Author, assignee or Manager+
/// - `PATCH  /api/v1/tasks/:id/status` - Board move; same rule as PATCH
/// - `DELETE /api/v1/tasks/:id` - Author or Manager+
/// - `GET    /api/v1/tasks/user/:userId` - Authored or assigned tasks
/// - `GET    /api/v1/tasks/:id/comments`, `POST /api/v1/tasks/:id/comments`
/// - `GET    /api/v1/tasks/:id/attachments`, `POST /api/v1/tasks/:id/attachments`
/// - `DELETE /api/v1/attachments/:id` - Uploader, task author or Manager+

use crate::{
    app::AppState,
    extract::{Json, Path, Query},
    error::{ApiError, ApiResult},
    response::{CacheTag, Envelope},
};
use axum::{extract::State, Extension};
use chrono::NaiveDate;
use planboard_shared::{
    auth::{
        authorization::{can_delete_task, can_edit_task, require_owner_or_role},
        context::AuthContext,
    },
    models::{
        attachment::{Attachment, CreateAttachment},
        comment::Comment,
        project::{dates_are_ordered, Project},
        task::{CreateTask, Task, TaskFilter, TaskPriority, TaskStatus, UpdateTask},
        user::UserRole,
    },
    pagination::{ListParams, Page},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// Defaults to `TO_DO`
    pub status: Option<TaskStatus>,

    /// Defaults to `Medium`
    pub priority: Option<TaskPriority>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub start_date: Option<NaiveDate>,

    pub due_date: Option<NaiveDate>,

    #[validate(range(min = 0, max = 1000, message = "Points must be between 0 and 1000"))]
    pub points: Option<i32>,

    pub project_id: Uuid,

    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub tags: Option<Vec<String>>,

    pub start_date: Option<NaiveDate>,

    pub due_date: Option<NaiveDate>,

    #[validate(range(min = 0, max = 1000, message = "Points must be between 0 and 1000"))]
    pub points: Option<i32>,

    pub assignee_id: Option<Uuid>,
}

/// Body of the drop on a board column
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 5000, message = "Comment must be 1 to 5000 characters"))]
    pub text: String,
}

/// URL of a file already uploaded to the image host
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttachmentRequest {
    #[validate(url(message = "Invalid file URL"))]
    pub file_url: String,

    #[validate(length(max = 255, message = "File name must be at most 255 characters"))]
    pub file_name: Option<String>,
}

/// Trims tags and drops empty and duplicate ones, keeping order
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

fn check_dates(start: Option<NaiveDate>, due: Option<NaiveDate>) -> ApiResult<()> {
    if dates_are_ordered(start, due) {
        Ok(())
    } else {
        Err(ApiError::invalid_field(
            "dueDate",
            "Due date cannot be before start date",
        ))
    }
}

fn task_tags(task: &Task) -> [CacheTag; 4] {
    [
        CacheTag::Tasks,
        CacheTag::Task(task.id),
        CacheTag::Project(task.project_id),
        CacheTag::Dashboard,
    ]
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<Task> {
    Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Envelope<Vec<Task>>> {
    let (tasks, total) = Task::list(&state.db, &filter, &params).await?;

    Ok(Envelope::page("Tasks retrieved", Page::new(tasks, &params, total)))
}

/// # Errors
///
/// - `400 Bad Request`: Unknown assignee
/// - `404 Not Found`: Unknown project
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Envelope<Task>> {
    req.validate()?;
    check_dates(req.start_date, req.due_date)?;

    if Project::find_by_id(&state.db, req.project_id).await?.is_none() {
        return Err(ApiError::not_found("Project"));
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or_default(),
            priority: req.priority.unwrap_or_default(),
            tags: clean_tags(req.tags),
            start_date: req.start_date,
            due_date: req.due_date,
            points: req.points,
            project_id: req.project_id,
            author_id: auth.user_id,
            assignee_id: req.assignee_id,
        },
    )
    .await?;

    tracing::info!(
        task_id = %task.id,
        project_id = %task.project_id,
        priority = task.priority.as_str(),
        "Task created"
    );

    let tags = task_tags(&task);
    Ok(Envelope::created("Task created", task).invalidates(tags))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<Task>> {
    let task = load(&state, id).await?;
    Ok(Envelope::ok("Task retrieved", task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Envelope<Task>> {
    req.validate()?;

    let existing = load(&state, id).await?;
    can_edit_task(&auth, &existing)?;

    check_dates(
        req.start_date.or(existing.start_date),
        req.due_date.or(existing.due_date),
    )?;

    let changes = UpdateTask {
        title: req.title,
        description: req.description,
        status: req.status,
        priority: req.priority,
        tags: req.tags.map(clean_tags),
        start_date: req.start_date,
        due_date: req.due_date,
        points: req.points,
        assignee_id: req.assignee_id,
    };

    if changes.is_empty() {
        return Ok(Envelope::ok("Nothing to update", existing));
    }

    let task = Task::update(&state.db, id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    let tags = task_tags(&task);
    Ok(Envelope::ok("Task updated", task).invalidates(tags))
}

/// Moves a card to another board column
///
/// Any column may follow any other. Dropping a card back on its own column
/// returns it unchanged.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/v1/tasks/:id/status
/// Content-Type: application/json
///
/// { "status": "UNDER_REVIEW" }
/// ```
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Envelope<Task>> {
    let existing = load(&state, id).await?;
    can_edit_task(&auth, &existing)?;

    let task = Task::update_status(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    if existing.status != task.status {
        tracing::info!(
            task_id = %id,
            from = existing.status.as_str(),
            to = task.status.as_str(),
            "Task moved"
        );
    }

    let tags = task_tags(&task);
    Ok(Envelope::ok("Task status updated", task).invalidates(tags))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<()>> {
    let task = load(&state, id).await?;
    can_delete_task(&auth, &task)?;

    Task::delete(&state.db, id).await?;

    tracing::info!(task_id = %id, by = %auth.user_id, "Task deleted");

    Ok(Envelope::message("Task deleted").invalidates(task_tags(&task)))
}

pub async fn list_user_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Envelope<Vec<Task>>> {
    let tasks = Task::list_by_user(&state.db, user_id).await?;
    Ok(Envelope::ok("Tasks retrieved", tasks))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<Vec<Comment>>> {
    load(&state, id).await?;

    let comments = Comment::list_by_task(&state.db, id).await?;
    Ok(Envelope::ok("Comments retrieved", comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Envelope<Comment>> {
    req.validate()?;
    load(&state, id).await?;

    let comment = Comment::create(&state.db, id, auth.user_id, req.text.trim()).await?;

    Ok(Envelope::created("Comment added", comment).invalidates([CacheTag::Task(id)]))
}

pub async fn list_attachments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<Vec<Attachment>>> {
    load(&state, id).await?;

    let attachments = Attachment::list_by_task(&state.db, id).await?;
    Ok(Envelope::ok("Attachments retrieved", attachments))
}

pub async fn create_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateAttachmentRequest>,
) -> ApiResult<Envelope<Attachment>> {
    req.validate()?;
    load(&state, id).await?;

    let attachment = Attachment::create(
        &state.db,
        CreateAttachment {
            task_id: id,
            uploaded_by: auth.user_id,
            file_url: req.file_url,
            file_name: req.file_name,
        },
    )
    .await?;

    Ok(Envelope::created("Attachment added", attachment).invalidates([CacheTag::Task(id)]))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<()>> {
    let attachment = Attachment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Attachment"))?;

    if !auth.is(attachment.uploaded_by) {
        let task = load(&state, attachment.task_id).await?;
        require_owner_or_role(&auth, task.author_id, UserRole::Manager)?;
    }

    Attachment::delete(&state.db, id).await?;

    Ok(Envelope::message("Attachment deleted").invalidates([CacheTag::Task(attachment.task_id)]))
}
