/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use planboard_api::{app::AppState, config::Config, mailer::Mailer};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let mailer = Mailer::from_config(&config.mail, &config.frontend.url)?;
/// let state = AppState::new(pool, config, mailer);
/// let app = planboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    mailer::Mailer,
    middleware::{auth::require_auth, security::SecurityHeadersLayer},
    response::INVALIDATE_TAGS_HEADER,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post},
    Router,
};
use planboard_shared::auth::jwt::TokenIssuer;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through the `State` extractor; all fields are
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    pub config: Arc<Config>,

    /// JWT signer/validator built from `config.jwt`
    pub tokens: TokenIssuer,

    pub mailer: Mailer,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, mailer: Mailer) -> Self {
        let tokens = TokenIssuer::with_ttls(
            &config.jwt.secret,
            chrono::Duration::minutes(config.jwt.access_ttl_minutes),
            chrono::Duration::days(config.jwt.refresh_ttl_days),
        );

        Self {
            db,
            config: Arc::new(config),
            tokens,
            mailer,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                       # public
/// └── /api/v1/
///     ├── /auth/*                       # login, sign-up, tokens, password flows
///     ├── /users, /developers, ...      # accounts and role directories
///     ├── /projects, /tasks, /attachments
///     ├── /teams, /team-members, /project-teams
///     ├── /search
///     └── /dashboard/summary
/// ```
///
/// Everything under `/api/v1` except the public auth endpoints runs behind
/// [`require_auth`].
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, compression, request tracing.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_layer = || axum::middleware::from_fn_with_state(state.clone(), require_auth);

    let public_auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh-token", post(routes::auth::refresh_token))
        .route("/logout", post(routes::auth::logout))
        .route("/sign-up", post(routes::auth::sign_up))
        .route("/forget-password", post(routes::auth::forget_password))
        .route("/reset-password", post(routes::auth::reset_password))
        .route("/verify-email", post(routes::auth::verify_email));

    let session_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/change-password", post(routes::auth::change_password))
        .route("/resend-verification", post(routes::auth::resend_verification))
        .layer(auth_layer());

    let user_routes = Router::new()
        .route("/users", get(routes::users::list_users))
        .route("/users/create-developer", post(routes::users::create_developer))
        .route("/users/create-manager", post(routes::users::create_manager))
        .route("/users/create-admin", post(routes::users::create_admin))
        .route("/users/create-super-admin", post(routes::users::create_super_admin))
        .route("/users/me", patch(routes::users::update_me))
        .route(
            "/users/:id",
            get(routes::users::get_user).delete(routes::users::delete_user),
        )
        .route("/users/:id/status", patch(routes::users::update_status))
        .route("/developers", get(routes::members::list_developers))
        .route("/developers/:id", get(routes::members::get_developer))
        .route("/managers", get(routes::members::list_managers))
        .route("/managers/:id", get(routes::members::get_manager))
        .route("/admins", get(routes::members::list_admins))
        .route("/admins/:id", get(routes::members::get_admin))
        .route("/super-admins", get(routes::members::list_super_admins))
        .route("/super-admins/:id", get(routes::members::get_super_admin));

    let project_routes = Router::new()
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        );

    let task_routes = Router::new()
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/user/:user_id", get(routes::tasks::list_user_tasks))
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id/status", patch(routes::tasks::update_task_status))
        .route(
            "/tasks/:id/comments",
            get(routes::tasks::list_comments).post(routes::tasks::create_comment),
        )
        .route(
            "/tasks/:id/attachments",
            get(routes::tasks::list_attachments).post(routes::tasks::create_attachment),
        )
        .route("/attachments/:id", delete(routes::tasks::delete_attachment));

    let team_routes = Router::new()
        .route(
            "/teams",
            get(routes::teams::list_teams).post(routes::teams::create_team),
        )
        .route(
            "/teams/:id",
            get(routes::teams::get_team)
                .patch(routes::teams::update_team)
                .delete(routes::teams::delete_team),
        )
        .route(
            "/team-members",
            get(routes::teams::list_team_members).post(routes::teams::add_team_member),
        )
        .route(
            "/team-members/:team_id/:user_id",
            delete(routes::teams::remove_team_member),
        )
        .route(
            "/project-teams",
            get(routes::teams::list_project_teams).post(routes::teams::link_project_team),
        )
        .route(
            "/project-teams/:project_id/:team_id",
            delete(routes::teams::unlink_project_team),
        );

    let protected_routes = Router::new()
        .merge(user_routes)
        .merge(project_routes)
        .merge(task_routes)
        .merge(team_routes)
        .route("/search", get(routes::search::search))
        .route("/dashboard/summary", get(routes::dashboard::summary))
        .layer(auth_layer());

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(session_routes))
        .merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS for the dashboard origins
///
/// Credentials are allowed because the dashboard authenticates with cookies,
/// which rules out a wildcard origin.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .frontend
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([INVALIDATE_TAGS_HEADER])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
