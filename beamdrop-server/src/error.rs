//! API error type with IntoResponse
//!
//! Bridge errors become JSON bodies `{"error": <kind>, "message": ...}` with a
//! status derived from the error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use beamdrop_core::BridgeError;
use serde_json::json;

/// Error returned to the calling page
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub BridgeError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            "not_found" => StatusCode::NOT_FOUND,
            "invalid_argument" => StatusCode::BAD_REQUEST,
            "type_conflict" | "duplicate" => StatusCode::CONFLICT,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            BridgeError::Fatal { .. } | BridgeError::Config { .. } => {
                // Log the actual error, return generic message
                tracing::error!(error = %self.0, "Internal error");
                "an internal error occurred".to_string()
            }
            BridgeError::InvocationFailed { .. } => {
                tracing::warn!(error = %self.0, "Service call failed");
                self.0.to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "error": self.0.kind(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use beamdrop_core::Resource;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) = body_of(BridgeError::not_found(Resource::Service, "Nope").into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "unknown service 'Nope'");
    }

    #[tokio::test]
    async fn invalid_argument_is_400() {
        let (status, body) = body_of(BridgeError::invalid_argument("expected 1 argument(s), got 0").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_argument");
    }

    #[tokio::test]
    async fn fatal_hides_details() {
        let (status, body) = body_of(BridgeError::fatal("secret path /etc").into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "an internal error occurred");
    }

    #[tokio::test]
    async fn unavailable_is_503() {
        let (status, _) = body_of(BridgeError::unavailable("host is stopped").into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
