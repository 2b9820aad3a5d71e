/// Team, team member and project-team endpoints
///
/// # Endpoints
///
/// - `GET    /api/v1/teams` - Paginated list
/// - `POST   /api/v1/teams` - Create with initial members (Manager+)
/// - `GET    /api/v1/teams/:id` - Team with members and linked projects
/// - `PATCH  /api/v1/teams/:id` - Manager+
/// - `DELETE /api/v1/teams/:id` - Admin+
/// - `GET    /api/v1/team-members?teamId=`
/// - `POST   /api/v1/team-members` - Manager+
/// - `DELETE /api/v1/team-members/:teamId/:userId` - Manager+
/// - `GET    /api/v1/project-teams?projectId=`
/// - `POST   /api/v1/project-teams` - Manager+
/// - `DELETE /api/v1/project-teams/:projectId/:teamId` - Manager+

use crate::{
    app::AppState,
    extract::{Json, Path, Query},
    error::{ApiError, ApiResult},
    response::{CacheTag, Envelope},
};
use axum::{extract::State, Extension};
use planboard_shared::{
    auth::{authorization::require_role, context::AuthContext},
    models::{
        profile::Member,
        project::Project,
        project_team::ProjectTeam,
        team::{CreateTeam, Team, UpdateTeam},
        team_member::TeamMember,
        user::UserRole,
    },
    pagination::{ListParams, Page},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    pub product_owner_id: Option<Uuid>,

    pub project_manager_id: Option<Uuid>,

    /// Users added to the team in the same transaction
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: Option<String>,

    pub product_owner_id: Option<Uuid>,

    pub project_manager_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,

    pub members: Vec<Member>,

    pub projects: Vec<Project>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberQuery {
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberRequest {
    pub team_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTeamQuery {
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTeamRequest {
    pub project_id: Uuid,
    pub team_id: Uuid,
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<Team> {
    Team::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team"))
}

pub async fn list_teams(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Envelope<Vec<Team>>> {
    let (teams, total) = Team::list(&state.db, &params).await?;

    Ok(Envelope::page("Teams retrieved", Page::new(teams, &params, total)))
}

/// Creates a team and its initial members atomically
///
/// # Errors
///
/// - `400 Bad Request`: Unknown member, owner or manager id
/// - `409 Conflict`: Team name taken
pub async fn create_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<Envelope<TeamDetail>> {
    require_role(&auth, UserRole::Manager)?;
    req.validate()?;

    let mut tx = state.db.begin().await?;

    let team = Team::create(
        &mut *tx,
        CreateTeam {
            name: req.name,
            product_owner_id: req.product_owner_id,
            project_manager_id: req.project_manager_id,
        },
    )
    .await?;

    for user_id in &req.member_ids {
        TeamMember::add(&mut *tx, team.id, *user_id).await?;
    }

    tx.commit().await?;

    tracing::info!(team_id = %team.id, members = req.member_ids.len(), "Team created");

    let members = Member::list_by_team(&state.db, team.id).await?;

    Ok(Envelope::created(
        "Team created",
        TeamDetail {
            team,
            members,
            projects: Vec::new(),
        },
    )
    .invalidates([CacheTag::Teams, CacheTag::TeamMembers, CacheTag::Dashboard]))
}

pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<TeamDetail>> {
    let team = load(&state, id).await?;
    let members = Member::list_by_team(&state.db, id).await?;
    let projects = Project::list_by_team(&state.db, id).await?;

    Ok(Envelope::ok(
        "Team retrieved",
        TeamDetail {
            team,
            members,
            projects,
        },
    ))
}

pub async fn update_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTeamRequest>,
) -> ApiResult<Envelope<Team>> {
    require_role(&auth, UserRole::Manager)?;
    req.validate()?;

    let team = Team::update(
        &state.db,
        id,
        UpdateTeam {
            name: req.name,
            product_owner_id: req.product_owner_id,
            project_manager_id: req.project_manager_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Team"))?;

    Ok(Envelope::ok("Team updated", team).invalidates([CacheTag::Teams, CacheTag::Team(id)]))
}

/// Deletes a team; its memberships and project links go with it
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<()>> {
    require_role(&auth, UserRole::Admin)?;

    if !Team::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Team"));
    }

    tracing::info!(team_id = %id, by = %auth.user_id, "Team deleted");

    Ok(Envelope::message("Team deleted").invalidates([
        CacheTag::Teams,
        CacheTag::Team(id),
        CacheTag::TeamMembers,
        CacheTag::ProjectTeams,
        CacheTag::Dashboard,
    ]))
}

pub async fn list_team_members(
    State(state): State<AppState>,
    Query(query): Query<TeamMemberQuery>,
) -> ApiResult<Envelope<Vec<TeamMember>>> {
    let members = match query.team_id {
        Some(team_id) => TeamMember::list_by_team(&state.db, team_id).await?,
        None => TeamMember::list_all(&state.db).await?,
    };

    Ok(Envelope::ok("Team members retrieved", members))
}

pub async fn add_team_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<TeamMemberRequest>,
) -> ApiResult<Envelope<TeamMember>> {
    require_role(&auth, UserRole::Manager)?;
    load(&state, req.team_id).await?;

    let member = TeamMember::add(&state.db, req.team_id, req.user_id).await?;

    Ok(Envelope::created("Member added to team", member).invalidates([
        CacheTag::TeamMembers,
        CacheTag::Team(req.team_id),
    ]))
}

pub async fn remove_team_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Envelope<()>> {
    require_role(&auth, UserRole::Manager)?;

    if !TeamMember::remove(&state.db, team_id, user_id).await? {
        return Err(ApiError::not_found("Team member"));
    }

    Ok(Envelope::message("Member removed from team").invalidates([
        CacheTag::TeamMembers,
        CacheTag::Team(team_id),
    ]))
}

pub async fn list_project_teams(
    State(state): State<AppState>,
    Query(query): Query<ProjectTeamQuery>,
) -> ApiResult<Envelope<Vec<ProjectTeam>>> {
    let links = match query.project_id {
        Some(project_id) => ProjectTeam::list_by_project(&state.db, project_id).await?,
        None => ProjectTeam::list_all(&state.db).await?,
    };

    Ok(Envelope::ok("Project teams retrieved", links))
}

pub async fn link_project_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ProjectTeamRequest>,
) -> ApiResult<Envelope<ProjectTeam>> {
    require_role(&auth, UserRole::Manager)?;

    if Project::find_by_id(&state.db, req.project_id).await?.is_none() {
        return Err(ApiError::not_found("Project"));
    }
    load(&state, req.team_id).await?;

    let link = ProjectTeam::link(&state.db, req.project_id, req.team_id).await?;

    Ok(Envelope::created("Team linked to project", link).invalidates([
        CacheTag::ProjectTeams,
        CacheTag::Project(req.project_id),
        CacheTag::Team(req.team_id),
    ]))
}

pub async fn unlink_project_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, team_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Envelope<()>> {
    require_role(&auth, UserRole::Manager)?;

    if !ProjectTeam::unlink(&state.db, project_id, team_id).await? {
        return Err(ApiError::not_found("Project team link"));
    }

    Ok(Envelope::message("Team unlinked from project").invalidates([
        CacheTag::ProjectTeams,
        CacheTag::Project(project_id),
        CacheTag::Team(team_id),
    ]))
}
