//! Server-sent-event push channel for dashboard subscribers.
//!
//! Event types on the wire: `connected` once on attach, `heartbeat` every
//! ~15 s, `overview_update` whenever any review changes, and `log_tail`
//! lines when the subscriber asked to follow a log file.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use review_engine::WaitOutcome;
use review_store::time::now_rfc3339_ms;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::Stream;
use tracing::{debug, instrument};

use crate::core::app_state::AppState;
use crate::routes::events::log_tail::LogTail;

const HEARTBEAT_EVERY: Duration = Duration::from_secs(15);
const TAIL_POLL_EVERY: Duration = Duration::from_secs(2);
const OVERVIEW_WAIT: Duration = Duration::from_secs(25);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventsQuery {
    /// File name (under the broker log dir) to follow as `log_tail` events.
    pub tail: Option<String>,
}

/// `GET /events`: long-lived SSE subscription.
#[instrument(name = "events_route", skip(state))]
pub async fn events_route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let broker = state.broker.clone();
    let log_dir = state.config.log_dir.clone();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("connected")
            .data(json!({ "at": now_rfc3339_ms() }).to_string()));

        let mut tail = query
            .tail
            .as_deref()
            .and_then(|name| LogTail::open(&log_dir, name));
        if query.tail.is_some() && tail.is_none() {
            debug!("rejected log tail request with unsafe file name");
        }

        let mut heartbeat = tokio::time::interval(HEARTBEAT_EVERY);
        heartbeat.tick().await; // the first tick is immediate
        let mut tail_timer = tokio::time::interval(TAIL_POLL_EVERY);
        tail_timer.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    yield Ok(Event::default()
                        .event("heartbeat")
                        .data(json!({ "at": now_rfc3339_ms() }).to_string()));
                }
                _ = tail_timer.tick(), if tail.is_some() => {
                    if let Some(t) = tail.as_mut() {
                        match t.poll().await {
                            Ok(lines) => {
                                for line in lines {
                                    yield Ok(Event::default().event("log_tail").data(line));
                                }
                            }
                            Err(e) => debug!(error = %e, "log tail poll failed"),
                        }
                    }
                }
                outcome = broker.wait_for_any_change(OVERVIEW_WAIT) => {
                    if outcome == WaitOutcome::Fired {
                        match broker.overview_snapshot().await {
                            Ok(snapshot) => match serde_json::to_string(&snapshot) {
                                Ok(body) => {
                                    yield Ok(Event::default().event("overview_update").data(body));
                                }
                                Err(e) => debug!(error = %e, "overview snapshot serialize failed"),
                            },
                            Err(e) => debug!(error = %e, "overview snapshot failed"),
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream)
}
