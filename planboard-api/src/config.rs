/// Configuration management for the API server
///
/// Configuration comes from environment variables, with a `.env` file
/// loaded first in development.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `RUN_MIGRATIONS`: Apply pending migrations at startup (default: true)
/// - `API_HOST` / `API_PORT`: Bind address (default: 0.0.0.0:8080)
/// - `PRODUCTION`: Marks cookies `Secure` (default: false)
/// - `JWT_SECRET`: HS256 signing secret, at least 32 characters (required)
/// - `JWT_ACCESS_TTL_MINUTES`: Access token lifetime (default: 15)
/// - `JWT_REFRESH_TTL_DAYS`: Refresh token lifetime (default: 7)
/// - `FRONTEND_URL`: Dashboard origin, used for CORS and emailed links
///   (default: http://localhost:3000)
/// - `CORS_ORIGINS`: Extra comma-separated allowed origins
/// - `FALLBACK_ACCESS_TOKEN`: Development-only token used when a request
///   carries no credentials
/// - `MAIL_API_URL`, `MAIL_API_KEY`, `MAIL_FROM`: HTTP mail provider; mail
///   is only logged when `MAIL_API_URL` is unset
/// - `RUST_LOG`, `LOG_FORMAT`: Logging, read in `main`
///
/// # Example
///
/// ```no_run
/// use planboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use std::env;
use std::str::FromStr;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub frontend: FrontendConfig,
    pub mail: MailConfig,

    /// Token accepted when a request has no Bearer header or cookie
    #[serde(skip_serializing)]
    pub fallback_access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Production mode: cookies get the `Secure` flag
    pub production: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: String,

    pub max_connections: u32,

    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JwtConfig {
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    pub access_ttl_minutes: i64,

    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrontendConfig {
    /// Dashboard origin, without trailing slash
    pub url: String,

    /// Allowed CORS origins, `url` included
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MailConfig {
    pub api_url: Option<String>,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    pub from: String,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails
    /// to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = non_empty(&lookup, "DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = non_empty(&lookup, "JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let access_ttl_minutes = parse_or(&lookup, "JWT_ACCESS_TTL_MINUTES", 15i64)?;
        let refresh_ttl_days = parse_or(&lookup, "JWT_REFRESH_TTL_DAYS", 7i64)?;
        if access_ttl_minutes <= 0 || refresh_ttl_days <= 0 {
            anyhow::bail!("JWT token lifetimes must be positive");
        }

        let frontend_url = non_empty(&lookup, "FRONTEND_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let mut cors_origins = vec![frontend_url.clone()];
        if let Some(extra) = non_empty(&lookup, "CORS_ORIGINS") {
            for origin in extra.split(',') {
                let origin = origin.trim().trim_end_matches('/');
                if !origin.is_empty() && !cors_origins.iter().any(|o| o == origin) {
                    cors_origins.push(origin.to_string());
                }
            }
        }

        Ok(Self {
            api: ApiConfig {
                host: non_empty(&lookup, "API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "API_PORT", 8080u16)?,
                production: parse_or(&lookup, "PRODUCTION", false)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?,
                run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_ttl_minutes,
                refresh_ttl_days,
            },
            frontend: FrontendConfig {
                url: frontend_url,
                cors_origins,
            },
            mail: MailConfig {
                api_url: non_empty(&lookup, "MAIL_API_URL"),
                api_key: non_empty(&lookup, "MAIL_API_KEY"),
                from: non_empty(&lookup, "MAIL_FROM")
                    .unwrap_or_else(|| "Planboard <no-reply@planboard.local>".to_string()),
            },
            fallback_access_token: non_empty(&lookup, "FALLBACK_ACCESS_TOKEN"),
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
