//! Error types for the facilitator service.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors surfaced by the facilitator HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorError {
    /// No engine is configured for the requested network.
    #[error("no configured engine for network {0:?}")]
    UnsupportedNetwork(String),

    /// The request body was missing, malformed, or not valid JSON.
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl From<JsonRejection> for FacilitatorError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for FacilitatorError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UnsupportedNetwork(_) => StatusCode::NOT_FOUND,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_network_maps_to_404() {
        let response = FacilitatorError::UnsupportedNetwork("nowhere".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_body_maps_to_400() {
        let response =
            FacilitatorError::InvalidBody("expected value at line 1".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
