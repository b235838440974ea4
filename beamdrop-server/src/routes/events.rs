//! Server-sent event feed: one open window per connected page.
//!
//! Each bus event becomes an SSE message whose `event` field is the bus event
//! name, `id` the bus sequence number and `data` the JSON payload. The window
//! closes when the page disconnects and the stream is dropped.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::{Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use beamdrop_core::{Application, BridgeError, Event, HostState, Window};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::ApiError;

fn default_label() -> String {
    "main".to_string()
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default = "default_label")]
    pub window: String,
}

/// Bus events for one window. Owns the window guard.
struct WindowFeed {
    _window: Window,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Stream for WindowFeed {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.rx.poll_recv(cx)
    }
}

fn sse_event(event: &Event) -> SseEvent {
    SseEvent::default()
        .event(&event.name)
        .id(event.sequence.to_string())
        .data(event.data.to_string())
}

/// GET /api/events?window=<label>
async fn events(
    State(app): State<Arc<Application>>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let state = app.state();
    if state != HostState::Running {
        return Err(BridgeError::unavailable(format!("host is {}", state)).into());
    }

    let (window, rx) = app.open_window(query.window);
    let feed = WindowFeed { _window: window, rx }
        .map(|event| Ok::<_, Infallible>(sse_event(&event)))
        .take_until(app.shutdown_token().cancelled_owned());

    Ok(Sse::new(feed).keep_alive(KeepAlive::default()))
}

pub fn router() -> Router<Arc<Application>> {
    Router::new().route("/api/events", get(events))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_defaults_to_main() {
        let query: EventsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.window, "main");
    }
}
