//! Deferred recheck endpoint

use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{AcceptedResponse, RetryPayload},
};

/// POST /retry
///
/// Schedules a single-target recheck after `retryInMs` and answers at once.
pub async fn schedule_retry(
    State(state): State<ApiState>,
    Json(payload): Json<RetryPayload>,
) -> ApiResult<(StatusCode, Json<AcceptedResponse>)> {
    let site_name = payload.site_name.trim();
    if site_name.is_empty() {
        return Err(ApiError::InvalidRequest("siteName must not be empty".to_string()));
    }

    info!("recheck of '{site_name}' requested in {} ms", payload.retry_in_ms);
    state
        .scheduler
        .schedule_after(Duration::from_millis(payload.retry_in_ms), site_name)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            status: "accepted".to_string(),
        }),
    ))
}
