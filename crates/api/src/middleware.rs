//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use residence_core::{AudienceService, BlockService, PollService, ReportService};
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub audience_service: AudienceService,
    pub block_service: BlockService,
    pub poll_service: PollService,
    pub report_service: ReportService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token into the user model and stores it in the request
/// extensions. Requests without a valid token pass through unauthenticated;
/// handlers that need a user reject them through [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.audience_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}
