//! Per-request failure taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body returned to the caller when the upstream cannot be reached.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Upstream request failed";

/// Errors that end a single request. None of them affect other requests.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The body does not satisfy the content type it claims.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// The inbound body exceeded the configured buffering limit.
    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Connection refused, DNS failure, timeout or any other transport error.
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ForwardError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ForwardError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ForwardError::UpstreamUnreachable(_) => {
                (status, UPSTREAM_FAILURE_MESSAGE).into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}
