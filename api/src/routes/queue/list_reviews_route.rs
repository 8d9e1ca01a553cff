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
pub struct ListReviewsRequest {
    pub status: Option<ReviewStatus>,
    pub category: Option<Category>,
    pub project: Option<String>,
    /// Long-poll: when true and nothing matches, park on the global signal
    /// until a matching review appears or the poll budget runs out.
    pub wait: bool,
}

/// `list_reviews`: the reviewer's queue. Ordered critical → normal → low,
/// oldest first within a tier.
#[instrument(name = "list_reviews_route", skip(state, body))]
pub async fn list_reviews_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ListReviewsRequest>,
) -> Response {
    let filter = Filter {
        status: body.status,
        category: body.category,
        project: body.project,
    };
    match state.broker.list_reviews(filter, body.wait).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
