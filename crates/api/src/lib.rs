//! HTTP API layer for residence-rs.
//!
//! This crate provides the JSON API over the community services:
//!
//! - **Endpoints**: blocks, polls and reports
//! - **Extractors**: the authenticated user
//! - **Middleware**: Bearer token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
