//! API endpoints.

mod blocks;
mod polls;
mod reports;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/blocks", blocks::router())
        .nest("/polls", polls::router())
        .nest("/reports", reports::router())
}

/// Default page size of list endpoints.
const fn default_limit() -> u64 {
    10
}

/// Largest page size a client may request.
const MAX_LIMIT: u64 = 100;
