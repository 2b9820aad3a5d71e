/// Authentication middleware
///
/// Resolves the caller's access token, loads the user it names and inserts
/// an [`AuthContext`] into the request extensions. Handlers behind this
/// layer read it with `Extension<AuthContext>`.
///
/// # Credential Sources
///
/// Tried in order, first match wins:
///
/// 1. `Authorization: Bearer <token>`
/// 2. The `accessToken` cookie set by `POST /auth/login`
/// 3. `FALLBACK_ACCESS_TOKEN`, when configured (development only)
///
/// The user row is reloaded on every request, so blocking or deleting an
/// account takes effect immediately and role changes apply without a new
/// token.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use planboard_shared::{
    auth::context::{parse_bearer, AuthContext},
    models::user::User,
};

use crate::{app::AppState, error::ApiError};

/// Cookie holding the access token
pub const ACCESS_COOKIE: &str = "accessToken";

/// Cookie holding the refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Picks the access token from the request, see the module docs for order
pub fn extract_access_token(headers: &HeaderMap, fallback: Option<&str>) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_bearer)
    {
        return Some(token.to_string());
    }

    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }

    fallback.map(str::to_string)
}

/// Rejects requests without a valid access token for an active user
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_access_token(
        req.headers(),
        state.config.fallback_access_token.as_deref(),
    )
    .ok_or_else(|| ApiError::Unauthorized("Missing access token".to_string()))?;

    let claims = state.tokens.validate_access(&token)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    if !user.status.can_sign_in() {
        tracing::warn!(user_id = %user.id, status = user.status.as_str(), "Rejected token of inactive user");
        return Err(ApiError::Unauthorized(format!(
            "Account is {}",
            user.status.as_str()
        )));
    }

    req.extensions_mut().insert(AuthContext::from_user(&user));

    Ok(next.run(req).await)
}
