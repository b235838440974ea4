//! Liveness of the host: 200 while running, 503 before start and after quit.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use beamdrop_core::{Application, HostState};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub state: HostState,
    pub windows: usize,
    pub listeners: usize,
    pub version: &'static str,
}

/// GET /health
async fn health(State(app): State<Arc<Application>>) -> (StatusCode, Json<HealthResponse>) {
    let state = app.state();
    let (code, status) = match state {
        HostState::Running => (StatusCode::OK, "ok"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    };

    let body = HealthResponse {
        status,
        state,
        windows: app.windows().count(),
        listeners: app.bus().listener_count(),
        version: env!("CARGO_PKG_VERSION"),
    };
    (code, Json(body))
}

pub fn router() -> Router<Arc<Application>> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamdrop_core::{application, BeamdropConfig};

    #[tokio::test]
    async fn unavailable_until_running() {
        let app = Arc::new(application(BeamdropConfig::default()).unwrap());
        let (_window, _rx) = app.open_window("main");

        let (code, Json(body)) = health(State(app)).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "unavailable");
        assert_eq!(body.state, HostState::Initializing);
        assert_eq!(body.windows, 1);
        assert_eq!(body.listeners, 1);
    }
}
