//! Session middleware for bearer token validation

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{context::RequestContext, error::ApiError, state::AppState};

/// Resolve the session and attach a [`RequestContext`] to the request.
///
/// Requests without a valid session stop here with 401.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state
        .sessions
        .get_session(req.headers())
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(RequestContext::new(user));

    Ok(next.run(req).await)
}
