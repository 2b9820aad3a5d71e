/// Middleware modules for the API server
///
/// - `auth`: access token resolution and the `AuthContext` extension
/// - `security`: hardening response headers

pub mod auth;
pub mod security;
