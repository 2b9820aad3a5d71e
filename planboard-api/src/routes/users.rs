/// User account endpoints
///
/// # Endpoints
///
/// - `POST   /api/v1/users/create-developer` (Manager+)
/// - `POST   /api/v1/users/create-manager` (Admin+)
/// - `POST   /api/v1/users/create-admin` (SuperAdmin)
/// - `POST   /api/v1/users/create-super-admin` (SuperAdmin)
/// - `GET    /api/v1/users` - Paginated list with `searchTerm`, `role`, `status` (Manager+)
/// - `GET    /api/v1/users/:id` - One user with profile (self or Manager+)
/// - `PATCH  /api/v1/users/:id/status` - Block or reactivate (strictly higher role)
/// - `DELETE /api/v1/users/:id` - Soft delete (strictly higher role)
/// - `PATCH  /api/v1/users/me` - Edit own username and profile

use crate::{
    app::AppState,
    extract::{Json, Path, Query},
    error::{ApiError, ApiResult},
    response::{CacheTag, Envelope},
};
use axum::{extract::State, Extension};
use planboard_shared::{
    auth::{
        authorization::{require_can_create, require_can_manage, require_role},
        context::AuthContext,
        password,
    },
    models::{
        profile::{CreateProfile, Member, Profile, UpdateProfile},
        user::{CreateUser, UpdateUser, User, UserFilter, UserRole, UserStatus},
    },
    pagination::{ListParams, Page},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Account created on someone's behalf
///
/// Without `password` a temporary one is generated and emailed, and the user
/// must change it at first login.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    #[validate(does_not_contain(pattern = "@", message = "Username cannot contain @"))]
    pub username: String,

    pub password: Option<String>,

    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[validate(length(max = 32, message = "Contact number must be at most 32 characters"))]
    pub contact_number: Option<String>,

    pub address: Option<String>,

    #[validate(url(message = "Invalid profile image URL"))]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAccount {
    pub user: User,
    pub profile: Profile,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: UserStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    #[validate(does_not_contain(pattern = "@", message = "Username cannot contain @"))]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 100, message = "First name cannot be empty"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,

    #[validate(length(max = 32, message = "Contact number must be at most 32 characters"))]
    pub contact_number: Option<String>,

    pub address: Option<String>,

    #[validate(url(message = "Invalid profile image URL"))]
    pub profile_image_url: Option<String>,
}

/// Shared body of the four `create-*` handlers
async fn create_account(
    state: AppState,
    auth: AuthContext,
    role: UserRole,
    req: CreateAccountRequest,
) -> ApiResult<Envelope<CreatedAccount>> {
    require_can_create(&auth, role)?;
    req.validate()?;

    let (plaintext, temporary) = match req.password {
        Some(given) => {
            password::validate_password_strength(&given)?;
            (given, false)
        }
        None => (password::generate_temporary_password(), true),
    };
    let password_hash = password::hash_password(&plaintext)?;

    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            email: req.email,
            username: req.username,
            password_hash,
            role,
            email_verified: true,
            needs_password_change: temporary,
        },
    )
    .await?;

    let profile = Profile::create(
        &mut *tx,
        CreateProfile {
            user_id: user.id,
            first_name: req.first_name,
            last_name: req.last_name,
            contact_number: req.contact_number,
            address: req.address,
            profile_image_url: req.profile_image_url,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        role = %role,
        created_by = %auth.user_id,
        "Account created"
    );

    if temporary {
        let email = state
            .mailer
            .welcome_email(&user.email, &user.username, role.as_str(), &plaintext);
        state.mailer.send_logged(email).await;
    }

    Ok(Envelope::created(
        format!("{} account created", role),
        CreatedAccount { user, profile },
    )
    .invalidates([CacheTag::Users, CacheTag::Dashboard]))
}

pub async fn create_developer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Envelope<CreatedAccount>> {
    create_account(state, auth, UserRole::Developer, req).await
}

pub async fn create_manager(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Envelope<CreatedAccount>> {
    create_account(state, auth, UserRole::Manager, req).await
}

pub async fn create_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Envelope<CreatedAccount>> {
    create_account(state, auth, UserRole::Admin, req).await
}

pub async fn create_super_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Envelope<CreatedAccount>> {
    create_account(state, auth, UserRole::SuperAdmin, req).await
}

/// Lists accounts, soft-deleted ones excluded
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<UserFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Envelope<Vec<User>>> {
    require_role(&auth, UserRole::Manager)?;

    let (users, total) = User::list(&state.db, &filter, &params).await?;

    Ok(Envelope::page(
        "Users retrieved",
        Page::new(users, &params, total),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<Member>> {
    if !auth.is(id) {
        require_role(&auth, UserRole::Manager)?;
    }

    let member = Member::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Envelope::ok("User retrieved", member))
}

/// Blocks or reactivates an account
///
/// Deletion goes through `DELETE /users/:id` instead.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Envelope<User>> {
    if req.status == UserStatus::Deleted {
        return Err(ApiError::invalid_field(
            "status",
            "Use DELETE /users/:id to delete an account",
        ));
    }

    let target = User::find_by_id(&state.db, id)
        .await?
        .filter(|u| u.status != UserStatus::Deleted)
        .ok_or_else(|| ApiError::not_found("User"))?;

    require_can_manage(&auth, target.id, target.role)?;

    let user = User::set_status(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(user_id = %id, status = user.status.as_str(), by = %auth.user_id, "User status changed");

    Ok(Envelope::ok("User status updated", user).invalidates([CacheTag::Users, CacheTag::User(id)]))
}

/// Soft-deletes an account; its tasks and comments stay
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<()>> {
    let target = User::find_by_id(&state.db, id)
        .await?
        .filter(|u| u.status != UserStatus::Deleted)
        .ok_or_else(|| ApiError::not_found("User"))?;

    require_can_manage(&auth, target.id, target.role)?;

    User::soft_delete(&state.db, id).await?;

    tracing::info!(user_id = %id, by = %auth.user_id, "User deleted");

    Ok(Envelope::message("User deleted").invalidates([
        CacheTag::Users,
        CacheTag::User(id),
        CacheTag::TeamMembers,
        CacheTag::Dashboard,
    ]))
}

/// Edits the caller's username and profile
///
/// Creates the profile when the account has none yet; names default to the
/// username in that case.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateMeRequest>,
) -> ApiResult<Envelope<Member>> {
    req.validate()?;

    if let Some(username) = req.username {
        User::update(
            &state.db,
            auth.user_id,
            UpdateUser {
                username: Some(username),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    }

    let changes = UpdateProfile {
        first_name: req.first_name,
        last_name: req.last_name,
        contact_number: req.contact_number,
        address: req.address,
        profile_image_url: req.profile_image_url,
    };

    if Profile::find_by_user(&state.db, auth.user_id).await?.is_some() {
        Profile::update(&state.db, auth.user_id, changes).await?;
    } else {
        let member = Member::find_by_id(&state.db, auth.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User"))?;

        Profile::create(
            &state.db,
            CreateProfile {
                user_id: auth.user_id,
                first_name: changes.first_name.unwrap_or_else(|| member.username.clone()),
                last_name: changes.last_name.unwrap_or_default(),
                contact_number: changes.contact_number,
                address: changes.address,
                profile_image_url: changes.profile_image_url,
            },
        )
        .await?;
    }

    let member = Member::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Envelope::ok("Profile updated", member).invalidates([
        CacheTag::User(auth.user_id),
        CacheTag::Users,
    ]))
}
