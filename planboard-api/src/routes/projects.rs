/// Project endpoints
///
/// # Endpoints
///
/// - `GET    /api/v1/projects` - Paginated list
/// - `POST   /api/v1/projects` - Create (Manager+); the caller becomes owner
/// - `GET    /api/v1/projects/:id`
/// - `PATCH  /api/v1/projects/:id` - Owner or Admin+
/// - `DELETE /api/v1/projects/:id` - Owner or Admin+; removes its tasks

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
        authorization::{can_edit_project, require_role},
        context::AuthContext,
    },
    models::{
        project::{dates_are_ordered, CreateProject, Project, UpdateProject},
        user::UserRole,
    },
    pagination::{ListParams, Page},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    pub description: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ApiResult<()> {
    if dates_are_ordered(start, end) {
        Ok(())
    } else {
        Err(ApiError::invalid_field(
            "endDate",
            "End date cannot be before start date",
        ))
    }
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Envelope<Vec<Project>>> {
    let (projects, total) = Project::list(&state.db, &params).await?;

    Ok(Envelope::page(
        "Projects retrieved",
        Page::new(projects, &params, total),
    ))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Envelope<Project>> {
    require_role(&auth, UserRole::Manager)?;
    req.validate()?;
    check_dates(req.start_date, req.end_date)?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            owner_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, owner_id = %auth.user_id, "Project created");

    Ok(Envelope::created("Project created", project)
        .invalidates([CacheTag::Projects, CacheTag::Dashboard]))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<Project>> {
    let project = load(&state, id).await?;
    Ok(Envelope::ok("Project retrieved", project))
}

/// Updates the given fields
///
/// Date order is checked against the stored value of whichever date is not
/// being changed.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Envelope<Project>> {
    req.validate()?;

    let existing = load(&state, id).await?;
    can_edit_project(&auth, &existing)?;

    check_dates(
        req.start_date.or(existing.start_date),
        req.end_date.or(existing.end_date),
    )?;

    let project = Project::update(
        &state.db,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Project"))?;

    Ok(Envelope::ok("Project updated", project)
        .invalidates([CacheTag::Projects, CacheTag::Project(id)]))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<()>> {
    let project = load(&state, id).await?;
    can_edit_project(&auth, &project)?;

    Project::delete(&state.db, id).await?;

    tracing::info!(project_id = %id, by = %auth.user_id, "Project deleted");

    Ok(Envelope::message("Project deleted").invalidates([
        CacheTag::Projects,
        CacheTag::Project(id),
        CacheTag::Tasks,
        CacheTag::ProjectTeams,
        CacheTag::Dashboard,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_check_dates() {
        assert!(check_dates(Some(date("2026-01-01")), Some(date("2026-02-01"))).is_ok());
        assert!(check_dates(Some(date("2026-01-01")), None).is_ok());

        match check_dates(Some(date("2026-02-01")), Some(date("2026-01-01"))) {
            Err(ApiError::ValidationError(details)) => assert_eq!(details[0].field, "endDate"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_create_request_parses_dates() {
        let req: CreateProjectRequest = serde_json::from_value(serde_json::json!({
            "name": "Website relaunch",
            "startDate": "2026-03-01",
            "endDate": "2026-06-30"
        }))
        .unwrap();

        assert_eq!(req.start_date, Some(date("2026-03-01")));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let req = CreateProjectRequest {
            name: String::new(),
            description: None,
            start_date: None,
            end_date: None,
        };
        assert!(req.validate().is_err());
    }
}
