//! Shared-secret authentication for internal endpoints

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::scheduler::INTERNAL_SECRET_HEADER;

/// Authentication middleware
///
/// Checks the `x-internal-secret` header against the configured secret
pub async fn internal_secret_middleware(
    State(expected_secret): State<String>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let secret = request
        .headers()
        .get(INTERNAL_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingSecret)?;

    if secret != expected_secret {
        return Err(AuthError::InvalidSecret);
    }

    Ok(next.run(request).await)
}

/// Authentication errors
#[derive(Debug)]
pub enum AuthError {
    MissingSecret,
    InvalidSecret,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingSecret => (StatusCode::UNAUTHORIZED, "Missing x-internal-secret header"),
            AuthError::InvalidSecret => (StatusCode::FORBIDDEN, "Invalid secret"),
        };

        (status, message).into_response()
    }
}
