//! Route registry: one `POST /tools/<verb>` per RPC verb, the SSE push
//! channel, and (optionally) the static dashboard.

pub mod discussion;
pub mod events;
pub mod observe;
pub mod queue;
pub mod review;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::core::app_state::AppState;
use crate::middleware_layer::json_extractor::json_error_mapper;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        // lifecycle
        .route(
            "/tools/create_review",
            post(review::create_review_route::create_review_route),
        )
        .route(
            "/tools/claim_review",
            post(review::claim_review_route::claim_review_route),
        )
        .route(
            "/tools/submit_verdict",
            post(review::submit_verdict_route::submit_verdict_route),
        )
        .route(
            "/tools/accept_counter_patch",
            post(review::counter_patch_routes::accept_counter_patch_route),
        )
        .route(
            "/tools/reject_counter_patch",
            post(review::counter_patch_routes::reject_counter_patch_route),
        )
        .route(
            "/tools/close_review",
            post(review::close_review_route::close_review_route),
        )
        // discussion
        .route(
            "/tools/add_message",
            post(discussion::add_message_route::add_message_route),
        )
        .route(
            "/tools/get_discussion",
            post(discussion::get_discussion_route::get_discussion_route),
        )
        // queue / reads
        .route(
            "/tools/list_reviews",
            post(queue::list_reviews_route::list_reviews_route),
        )
        .route(
            "/tools/get_review_status",
            post(queue::get_review_status_route::get_review_status_route),
        )
        .route(
            "/tools/get_proposal",
            post(queue::get_proposal_route::get_proposal_route),
        )
        // observability
        .route(
            "/tools/get_activity_feed",
            post(observe::activity_feed_route::activity_feed_route),
        )
        .route(
            "/tools/get_audit_log",
            post(observe::audit_log_route::audit_log_route),
        )
        .route(
            "/tools/get_review_stats",
            post(observe::stats_route::stats_route),
        )
        .route(
            "/tools/get_review_timeline",
            post(observe::timeline_route::timeline_route),
        )
        // push channel
        .route("/events", get(events::events_route::events_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state.clone());

    match &state.config.assets_dir {
        // The assets dir was canonicalized at startup; ServeDir refuses
        // traversal out of it.
        Some(dir) => api.nest_service("/dashboard", ServeDir::new(dir.clone())),
        None => api,
    }
}
