//! Page-originated service calls

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use beamdrop_core::{Application, ServiceCall};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::extractors::CallBody;

#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub result: Value,
}

/// POST /api/call
///
/// Body: `{"service": "GreetService", "method": "Greet", "args": ["World"]}`.
/// A body that is not a call answers `invalid_argument` like a bad argument would.
async fn call(
    State(app): State<Arc<Application>>,
    CallBody(call): CallBody<ServiceCall>,
) -> Result<Json<CallResponse>, ApiError> {
    let result = app.invoke(call)?;
    Ok(Json(CallResponse { result }))
}

pub fn router() -> Router<Arc<Application>> {
    Router::new().route("/api/call", post(call))
}
