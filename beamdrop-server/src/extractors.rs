//! Custom Axum extractors

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use beamdrop_core::BridgeError;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body whose rejections answer with the page error body
pub struct CallBody<T>(pub T);

impl<T, S> FromRequest<S> for CallBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| BridgeError::invalid_argument(rejection.body_text()))?;
        Ok(Self(value))
    }
}
