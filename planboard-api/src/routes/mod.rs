/// API route handlers
///
/// Organized by resource:
///
/// - `health`: liveness and database status
/// - `auth`: login, tokens, sign-up, password and email flows
/// - `users`: account creation, listing, status, self-service edits
/// - `members`: per-role user directories (`/developers`, `/managers`, ...)
/// - `projects`, `tasks`, `teams`: board resources
/// - `search`: cross-resource text search
/// - `dashboard`: home page counters
///
/// Successful responses use [`crate::response::Envelope`]; mutations name the
/// cache tags they make stale.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod members;
pub mod projects;
pub mod search;
pub mod tasks;
pub mod teams;
pub mod users;
