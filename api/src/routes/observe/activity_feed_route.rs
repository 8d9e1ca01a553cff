use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use review_engine::queries::Filter;
use review_store::{Category, ReviewStatus};
use serde::Deserialize;
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivityFeedRequest {
    pub status: Option<ReviewStatus>,
    pub category: Option<Category>,
    pub project: Option<String>,
}

/// `get_activity_feed`: most recently updated reviews with a preview of the
/// latest message and the message count.
#[instrument(name = "activity_feed_route", skip(state, body))]
pub async fn activity_feed_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActivityFeedRequest>,
) -> Response {
    let filter = Filter {
        status: body.status,
        category: body.category,
        project: body.project,
    };
    match state.broker.get_activity_feed(filter).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
