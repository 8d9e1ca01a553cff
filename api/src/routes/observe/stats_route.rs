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

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatsRequest {
    pub project: Option<String>,
}

/// `get_review_stats`: counts, approval rate and timing metrics for the
/// whole lifetime of the store.
#[instrument(name = "stats_route", skip(state, body))]
pub async fn stats_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StatsRequest>,
) -> Response {
    match state.broker.get_review_stats(body.project.as_deref()).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
