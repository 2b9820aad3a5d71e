/// Health check endpoint
///
/// Verifies that the server is running, the database answers and every
/// migration has been applied. Always answers 200; `status` says whether
/// the service is usable.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "migrationsUpToDate": true,
///   "pool": { "active_connections": 1, "idle_connections": 4, "total_connections": 5 }
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use planboard_shared::db::{
    migrations::get_migration_status,
    pool::{get_pool_stats, health_check as database_health, PoolStats},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: &'static str,

    pub version: &'static str,

    /// `connected` or `disconnected`
    pub database: &'static str,

    /// None when the database is unreachable
    pub migrations_up_to_date: Option<bool>,

    pub pool: PoolStats,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match database_health(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            false
        }
    };

    let migrations_up_to_date = if connected {
        get_migration_status(&state.db)
            .await
            .map(|status| status.is_up_to_date)
            .ok()
    } else {
        None
    };

    let healthy = connected && migrations_up_to_date.unwrap_or(false);

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        version: planboard_shared::VERSION,
        database: if connected { "connected" } else { "disconnected" },
        migrations_up_to_date,
        pool: get_pool_stats(&state.db),
    })
}
