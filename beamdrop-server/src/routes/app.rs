//! Application introspection and control

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use beamdrop_core::config::WindowConfig;
use beamdrop_core::services::ServiceDescriptor;
use beamdrop_core::{Application, HostState, WindowInfo};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct EventTypeInfo {
    pub name: String,
    pub payload: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub app: String,
    pub state: HostState,
    pub window: WindowConfig,
    /// Event carrying the backend clock, when the ticker is enabled
    pub ticker_event: Option<String>,
    pub windows: Vec<WindowInfo>,
    pub listeners: usize,
    pub events: Vec<EventTypeInfo>,
}

/// GET /api/services
async fn services(State(app): State<Arc<Application>>) -> Json<Vec<ServiceDescriptor>> {
    Json(app.services().describe())
}

/// GET /api/state
async fn state(State(app): State<Arc<Application>>) -> Json<StateResponse> {
    let events = app
        .bus()
        .event_types()
        .into_iter()
        .map(|(name, payload)| EventTypeInfo { name, payload })
        .collect();

    let ticker = &app.config().ticker;
    Json(StateResponse {
        app: app.config().app.name.clone(),
        state: app.state(),
        window: app.config().window.clone(),
        ticker_event: ticker.enabled.then(|| ticker.event.clone()),
        windows: app.windows().list(),
        listeners: app.bus().listener_count(),
        events,
    })
}

/// POST /api/quit
async fn quit(State(app): State<Arc<Application>>) -> StatusCode {
    tracing::info!("Quit requested by page");
    app.quit();
    StatusCode::ACCEPTED
}

pub fn router() -> Router<Arc<Application>> {
    Router::new()
        .route("/api/services", get(services))
        .route("/api/state", get(state))
        .route("/api/quit", post(quit))
}
