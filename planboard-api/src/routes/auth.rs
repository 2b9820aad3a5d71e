/// Authentication endpoints
///
/// # Endpoints
///
/// Public:
/// - `POST /api/v1/auth/login` - Exchange credentials for tokens (also set as cookies)
/// - `POST /api/v1/auth/refresh-token` - New access token from a refresh token
/// - `POST /api/v1/auth/logout` - Clear the auth cookies
/// - `POST /api/v1/auth/sign-up` - Developer self-registration
/// - `POST /api/v1/auth/forget-password` - Email a password reset link
/// - `POST /api/v1/auth/reset-password` - Set a new password with a reset token
/// - `POST /api/v1/auth/verify-email` - Confirm an email address
///
/// Authenticated:
/// - `GET  /api/v1/auth/me` - Current user and profile
/// - `POST /api/v1/auth/change-password`
/// - `POST /api/v1/auth/resend-verification`

use crate::{
    app::AppState,
    extract::Json,
    error::{ApiError, ApiResult},
    middleware::auth::{ACCESS_COOKIE, REFRESH_COOKIE},
    response::{CacheTag, Envelope},
};
use axum::{extract::State, Extension};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use planboard_shared::{
    auth::{context::AuthContext, jwt::TokenPair, password, token},
    models::{
        auth_token::{AuthToken, TokenPurpose},
        profile::{CreateProfile, Profile},
        user::{normalize_email, CreateUser, UpdateUser, User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address or username
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,

    #[serde(flatten)]
    pub tokens: TokenPair,

    /// The client should force a password change before anything else
    pub needs_password_change: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

/// Merged fields of the sign-up wizard steps
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    #[validate(does_not_contain(pattern = "@", message = "Username cannot contain @"))]
    pub username: String,

    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,

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
pub struct AccountResponse {
    pub user: User,
    pub profile: Option<Profile>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,

    pub new_password: String,

    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

fn invalid_token() -> ApiError {
    ApiError::BadRequest("Invalid or expired token".to_string())
}

/// Login endpoint
///
/// Accepts an email address or a username in `email`. Blocked and deleted
/// accounts are refused with the same message as a wrong password.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/login
/// Content-Type: application/json
///
/// { "email": "dev@example.com", "password": "SecureP@ss123" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Logged in successfully",
///   "data": {
///     "user": { "id": "uuid", "role": "DEVELOPER", "...": "..." },
///     "accessToken": "eyJ...",
///     "refreshToken": "eyJ...",
///     "expiresIn": 900,
///     "needsPasswordChange": false
///   }
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
/// - `422 Unprocessable Entity`: Missing fields
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Envelope<LoginResponse>)> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let Some(user) = User::find_by_login(&state.db, &req.email).await? else {
        password::verify_dummy(&req.password);
        return Err(invalid());
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    if !user.status.can_sign_in() {
        tracing::info!(user_id = %user.id, status = user.status.as_str(), "Login refused");
        return Err(invalid());
    }

    User::update_last_login(&state.db, user.id).await?;

    let tokens = state.tokens.issue_pair(user.id, &user.email, user.role)?;
    let secure = state.config.api.production;

    let jar = jar
        .add(auth_cookie(ACCESS_COOKIE, tokens.access_token.clone(), secure))
        .add(auth_cookie(REFRESH_COOKIE, tokens.refresh_token.clone(), secure));

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    let needs_password_change = user.needs_password_change;
    Ok((
        jar,
        Envelope::ok(
            "Logged in successfully",
            LoginResponse {
                user,
                tokens,
                needs_password_change,
            },
        ),
    ))
}

/// Token refresh endpoint
///
/// The refresh token comes from the body or, when absent, the
/// `refreshToken` cookie. The new access token carries the user's current
/// role, and is also set as the `accessToken` cookie.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing, invalid or expired refresh token, or an
///   inactive account
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<(CookieJar, Envelope<RefreshResponse>)> {
    let from_body = body.and_then(|Json(req)| req.refresh_token);
    let refresh_token = from_body
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing refresh token".to_string()))?;

    let claims = state.tokens.validate_refresh(&refresh_token)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .filter(|u| u.status.can_sign_in())
        .ok_or_else(|| ApiError::Unauthorized("Account is not active".to_string()))?;

    let access_token = state.tokens.access_token(user.id, &user.email, user.role)?;
    let jar = jar.add(auth_cookie(
        ACCESS_COOKIE,
        access_token.clone(),
        state.config.api.production,
    ));

    Ok((
        jar,
        Envelope::ok(
            "Access token refreshed",
            RefreshResponse {
                access_token,
                expires_in: state.tokens.access_ttl().num_seconds(),
            },
        ),
    ))
}

/// Clears both auth cookies
///
/// Tokens are stateless, so an access token copied elsewhere stays valid
/// until it expires.
pub async fn logout(jar: CookieJar) -> (CookieJar, Envelope<()>) {
    let jar = jar
        .remove(removal_cookie(ACCESS_COOKIE))
        .remove(removal_cookie(REFRESH_COOKIE));

    (jar, Envelope::message("Logged out successfully"))
}

/// Developer self-registration
///
/// The user and profile are written in one transaction; a mismatched
/// confirmation or weak password creates nothing. A verification email is
/// sent afterwards. A mail failure is logged and the account still exists,
/// since `resend-verification` can send another link.
///
/// # Errors
///
/// - `409 Conflict`: Email or username taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<Envelope<AccountResponse>> {
    req.validate()?;
    password::validate_password_strength(&req.password)?;

    let password_hash = password::hash_password(&req.password)?;

    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            email: req.email,
            username: req.username,
            password_hash,
            role: UserRole::Developer,
            email_verified: false,
            needs_password_change: false,
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

    tracing::info!(user_id = %user.id, "Developer signed up");

    let token = AuthToken::issue(&state.db, user.id, TokenPurpose::EmailVerification).await?;
    let email = state
        .mailer
        .verification_email(&user.email, &profile.first_name, &token);
    state.mailer.send_logged(email).await;

    Ok(Envelope::created(
        "Account created, check your email to verify it",
        AccountResponse {
            user,
            profile: Some(profile),
        },
    )
    .invalidates([CacheTag::Users]))
}

/// Current user and profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<AccountResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    let profile = Profile::find_by_user(&state.db, user.id).await?;

    Ok(Envelope::ok(
        "Profile retrieved",
        AccountResponse { user, profile },
    ))
}

/// Changes the caller's password and clears `needsPasswordChange`
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
/// - `422 Unprocessable Entity`: Mismatch, weak password, or unchanged password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Envelope<()>> {
    req.validate()?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if !password::verify_password(&req.old_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    if req.old_password == req.new_password {
        return Err(ApiError::invalid_field(
            "newPassword",
            "New password must differ from the current one",
        ));
    }

    password::validate_password_strength(&req.new_password)
        .map_err(|e| ApiError::invalid_field("newPassword", e.to_string()))?;

    User::update(
        &state.db,
        user.id,
        UpdateUser {
            password_hash: Some(password::hash_password(&req.new_password)?),
            needs_password_change: Some(false),
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(Envelope::message("Password changed successfully").invalidates([CacheTag::User(user.id)]))
}

/// Emails a reset link
///
/// Always answers 200 so the endpoint can't be used to discover which emails
/// have accounts.
pub async fn forget_password(
    State(state): State<AppState>,
    Json(req): Json<ForgetPasswordRequest>,
) -> ApiResult<Envelope<()>> {
    req.validate()?;

    let email = normalize_email(&req.email);
    match User::find_by_email(&state.db, &email).await? {
        Some(user) if user.status.can_sign_in() => {
            let token = AuthToken::issue(&state.db, user.id, TokenPurpose::PasswordReset).await?;
            let message = state.mailer.password_reset_email(&user.email, &token);
            state.mailer.send_logged(message).await;
            tracing::info!(user_id = %user.id, "Password reset requested");
        }
        _ => tracing::debug!("Password reset requested for unknown or inactive account"),
    }

    Ok(Envelope::message(
        "If an account exists for that email, a reset link has been sent",
    ))
}

/// Sets a new password with a single-use reset token
///
/// The password is checked before the token is consumed, so a rejected
/// password leaves the link usable.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown, used or expired token
/// - `422 Unprocessable Entity`: Mismatch or weak password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Envelope<()>> {
    req.validate()?;

    if !token::is_well_formed(&req.token) {
        return Err(invalid_token());
    }

    password::validate_password_strength(&req.password)?;
    let password_hash = password::hash_password(&req.password)?;

    let user_id = AuthToken::consume(&state.db, &req.token, TokenPurpose::PasswordReset)
        .await?
        .ok_or_else(invalid_token)?;

    User::update(
        &state.db,
        user_id,
        UpdateUser {
            password_hash: Some(password_hash),
            needs_password_change: Some(false),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(user_id = %user_id, "Password reset");

    Ok(Envelope::message("Password has been reset").invalidates([CacheTag::User(user_id)]))
}

/// Confirms an email address with a single-use verification token
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> ApiResult<Envelope<User>> {
    req.validate()?;

    if !token::is_well_formed(&req.token) {
        return Err(invalid_token());
    }

    let user_id = AuthToken::consume(&state.db, &req.token, TokenPurpose::EmailVerification)
        .await?
        .ok_or_else(invalid_token)?;

    let user = User::update(
        &state.db,
        user_id,
        UpdateUser {
            email_verified: Some(true),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(user_id = %user.id, "Email verified");

    Ok(Envelope::ok("Email verified", user).invalidates([CacheTag::User(user_id), CacheTag::Users]))
}

/// Sends a fresh verification link; earlier links stop working
///
/// # Errors
///
/// - `400 Bad Request`: Email already verified
pub async fn resend_verification(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<()>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if user.email_verified {
        return Err(ApiError::BadRequest("Email is already verified".to_string()));
    }

    let name = Profile::find_by_user(&state.db, user.id)
        .await?
        .map(|p| p.first_name)
        .unwrap_or_else(|| user.username.clone());

    let token = AuthToken::issue(&state.db, user.id, TokenPurpose::EmailVerification).await?;
    state
        .mailer
        .send(state.mailer.verification_email(&user.email, &name, &token))
        .await
        .map_err(|e| ApiError::ServiceUnavailable(format!("Could not send email: {}", e)))?;

    Ok(Envelope::message("Verification email sent"))
}
