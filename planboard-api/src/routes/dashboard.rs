/// Home page counters
///
/// ```text
/// GET /api/v1/dashboard/summary
/// ```
///
/// ```json
/// {
///   "tasksByStatus": [{ "key": "TO_DO", "count": 4 }],
///   "tasksByPriority": [{ "key": "Urgent", "count": 1 }],
///   "totalTasks": 12,
///   "totalProjects": 3,
///   "totalTeams": 2,
///   "totalUsers": 9
/// }
/// ```
///
/// Statuses and priorities without tasks are omitted from the breakdowns.

use crate::{app::AppState, error::ApiResult, response::Envelope};
use axum::extract::State;
use planboard_shared::models::{
    project::Project,
    task::{Task, TaskCount, TaskPriority, TaskStatus},
    team::Team,
    user::User,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub tasks_by_status: Vec<TaskCount<TaskStatus>>,
    pub tasks_by_priority: Vec<TaskCount<TaskPriority>>,
    pub total_tasks: i64,
    pub total_projects: i64,
    pub total_teams: i64,
    pub total_users: i64,
}

pub async fn summary(State(state): State<AppState>) -> ApiResult<Envelope<DashboardSummary>> {
    let db = &state.db;

    let (tasks_by_status, tasks_by_priority, total_tasks, total_projects, total_teams, total_users) = tokio::try_join!(
        Task::count_by_status(db),
        Task::count_by_priority(db),
        Task::count(db),
        Project::count(db),
        Team::count(db),
        User::count(db),
    )?;

    Ok(Envelope::ok(
        "Dashboard summary",
        DashboardSummary {
            tasks_by_status,
            tasks_by_priority,
            total_tasks,
            total_projects,
            total_teams,
            total_users,
        },
    ))
}
