/// Cross-resource search
///
/// ```text
/// GET /api/v1/search?query=login
/// ```
///
/// Case-insensitive substring match on task titles and descriptions,
/// project names and descriptions, and user emails and usernames. Each
/// group is capped at [`RESULT_LIMIT`].

use crate::{app::AppState, error::ApiResult, extract::Query, response::Envelope};
use axum::extract::State;
use planboard_shared::models::{project::Project, task::Task, user::User};
use serde::{Deserialize, Serialize};

/// Largest number of hits returned per resource
pub const RESULT_LIMIT: i64 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchResults {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub users: Vec<User>,
}

/// An empty or missing query returns empty groups
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Envelope<SearchResults>> {
    let term = query.query.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Ok(Envelope::ok("Search results", SearchResults::default()));
    }

    let (tasks, projects, users) = tokio::try_join!(
        Task::search(&state.db, term, RESULT_LIMIT),
        Project::search(&state.db, term, RESULT_LIMIT),
        User::search(&state.db, term, RESULT_LIMIT),
    )?;

    tracing::debug!(
        term,
        tasks = tasks.len(),
        projects = projects.len(),
        users = users.len(),
        "Search"
    );

    Ok(Envelope::ok(
        "Search results",
        SearchResults {
            tasks,
            projects,
            users,
        },
    ))
}
