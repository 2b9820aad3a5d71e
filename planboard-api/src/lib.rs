//! # Planboard API Server Library
//!
//! REST API behind the Planboard dashboard: boards, projects, teams and
//! role-gated user management.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from environment variables
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: `Json`/`Query`/`Path` extractors that reject with `ApiError`
//! - `mailer`: Verification, reset and welcome emails
//! - `middleware`: Authentication and security headers
//! - `response`: Success envelope and cache-tag invalidation header
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod mailer;
pub mod middleware;
pub mod response;
pub mod routes;
