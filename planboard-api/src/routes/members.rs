/// Per-role user directories
///
/// `/developers`, `/managers`, `/admins` and `/super-admins` list users of
/// one role joined with their profile. Any signed-in user may read them;
/// the dashboard needs them to pick assignees and team owners.
///
/// # Endpoints
///
/// - `GET /api/v1/{developers,managers,admins,super-admins}` - Paginated
/// - `GET /api/v1/{developers,managers,admins,super-admins}/:id`

use crate::{
    app::AppState,
    extract::{Path, Query},
    error::{ApiError, ApiResult},
    response::Envelope,
};
use axum::extract::State;
use planboard_shared::{
    models::{profile::Member, user::UserRole},
    pagination::{ListParams, Page},
};
use uuid::Uuid;

fn label(role: UserRole) -> &'static str {
    match role {
        UserRole::Developer => "Developer",
        UserRole::Manager => "Manager",
        UserRole::Admin => "Admin",
        UserRole::SuperAdmin => "Super admin",
    }
}

async fn list_members(
    state: &AppState,
    role: UserRole,
    params: ListParams,
) -> ApiResult<Envelope<Vec<Member>>> {
    let (members, total) = Member::list_by_role(&state.db, role, &params).await?;

    Ok(Envelope::page(
        format!("{}s retrieved", label(role)),
        Page::new(members, &params, total),
    ))
}

/// 404 when the id exists but has another role
async fn get_member(state: &AppState, role: UserRole, id: Uuid) -> ApiResult<Envelope<Member>> {
    let member = Member::find_by_id_and_role(&state.db, id, role)
        .await?
        .ok_or_else(|| ApiError::not_found(label(role)))?;

    Ok(Envelope::ok(format!("{} retrieved", label(role)), member))
}

pub async fn list_developers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Envelope<Vec<Member>>> {
    list_members(&state, UserRole::Developer, params).await
}

pub async fn get_developer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<Member>> {
    get_member(&state, UserRole::Developer, id).await
}

pub async fn list_managers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Envelope<Vec<Member>>> {
    list_members(&state, UserRole::Manager, params).await
}

pub async fn get_manager(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<Member>> {
    get_member(&state, UserRole::Manager, id).await
}

pub async fn list_admins(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Envelope<Vec<Member>>> {
    list_members(&state, UserRole::Admin, params).await
}

pub async fn get_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<Member>> {
    get_member(&state, UserRole::Admin, id).await
}

pub async fn list_super_admins(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Envelope<Vec<Member>>> {
    list_members(&state, UserRole::SuperAdmin, params).await
}

pub async fn get_super_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<Member>> {
    get_member(&state, UserRole::SuperAdmin, id).await
}
