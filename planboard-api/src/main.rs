//! # Planboard API Server
//!
//! Serves the REST API used by the Planboard dashboard.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (and `.env`)
//! 2. Connect the database pool and apply pending migrations
//! 3. Serve until Ctrl-C or SIGTERM, then drain requests and close the pool
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/planboard JWT_SECRET=... cargo run -p planboard-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines; `RUST_LOG` controls verbosity.

use planboard_api::{
    app::{build_router, AppState},
    config::Config,
    mailer::Mailer,
};
use planboard_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::auth_token::AuthToken,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "planboard_api=debug,planboard_shared=info,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining requests");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before the filter reads RUST_LOG
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "Planboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    if config.fallback_access_token.is_some() {
        tracing::warn!("FALLBACK_ACCESS_TOKEN is set; unauthenticated requests use it");
    }

    let pool = create_pool(DatabaseConfig::new(
        config.database.url.clone(),
        config.database.max_connections,
    ))
    .await?;

    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    match AuthToken::purge_stale(&pool).await {
        Ok(0) => {}
        Ok(purged) => tracing::info!(purged, "Removed stale email tokens"),
        Err(e) => tracing::warn!(error = %e, "Failed to purge stale email tokens"),
    }

    let mailer = Mailer::from_config(&config.mail, &config.frontend.url)?;
    tracing::info!(mailer = ?mailer, "Mailer ready");

    let address = config.bind_address();
    let state = AppState::new(pool.clone(), config, mailer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}
