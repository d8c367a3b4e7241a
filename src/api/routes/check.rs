//! Sweep trigger endpoint

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::{
    state::ApiState,
    types::{CheckQuery, CheckResponse},
};
use crate::sweep::SweepRequest;

/// GET /check?site=<name>&delay=<ms>
///
/// Runs one sweep to completion. Down targets are reported through the
/// notification sinks, so the answer is the same whatever the sweep found.
pub async fn run_check(
    State(state): State<ApiState>,
    Query(query): Query<CheckQuery>,
) -> Json<CheckResponse> {
    let request = SweepRequest::from(query);
    state.orchestrator.run_sweep(request).await;

    Json(CheckResponse::passed())
}
