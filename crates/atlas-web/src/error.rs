//! JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use atlas_common::AtlasError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Atlas(#[from] AtlasError),

    #[error("{0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::Atlas(AtlasError::NotFound(what.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Atlas(AtlasError::NotFound(_) | AtlasError::InvalidLayer { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Atlas(AtlasError::Fetch(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Atlas(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Request failed");
        }
        let key = match &self {
            ApiError::Atlas(e) => e.key().map(|k| k.to_string()),
            ApiError::BadRequest(_) => None,
        };
        (status, Json(ErrorBody { error: self.to_string(), key })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_common::{Dataset, FetchFailure};

    #[test]
    fn test_status_mapping() {
        let fetch: ApiError = AtlasError::from(FetchFailure::status(Dataset::Modules.key(), 500)).into();
        assert_eq!(fetch.status(), StatusCode::BAD_GATEWAY);

        let layer: ApiError = AtlasError::InvalidLayer { layer: 40, n_layers: 18 }.into();
        assert_eq!(layer.status(), StatusCode::NOT_FOUND);

        assert_eq!(ApiError::not_found("feature 9").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::BadRequest("bad pair".into()).status(), StatusCode::BAD_REQUEST);

        let mismatch: ApiError = AtlasError::TypeMismatch { key: Dataset::Modules.key() }.into();
        assert_eq!(mismatch.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
