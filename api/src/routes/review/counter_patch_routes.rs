//! Proposer's accept/reject on a pending counter-patch.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppError;

#[derive(Debug, Deserialize)]
pub struct CounterPatchRequest {
    pub review_id: String,
}

/// `accept_counter_patch`: re-validates against the working tree as it is
/// now; a drifted tree returns `stale_counter_patch` and changes nothing.
#[instrument(name = "accept_counter_patch_route", skip(state), fields(review_id = %body.review_id))]
pub async fn accept_counter_patch_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CounterPatchRequest>,
) -> Response {
    match state.broker.accept_counter_patch(&body.review_id).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}

/// `reject_counter_patch`: drops the pending patch, keeps the proposal.
#[instrument(name = "reject_counter_patch_route", skip(state), fields(review_id = %body.review_id))]
pub async fn reject_counter_patch_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CounterPatchRequest>,
) -> Response {
    match state.broker.reject_counter_patch(&body.review_id).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
