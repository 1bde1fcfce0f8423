//! HTTP clients and push transports for the judge APIs.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

mod judge;
mod sse;
mod ws;

pub use judge::JudgeClient;
pub use reqwest::StatusCode;
pub use sse::{SseDecoder, SseTransport};
pub use ws::WebSocketTransport;

use crate::transport::TransportError;

/// Errors produced by the SDK HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server rejected the bearer token.
    #[error("unauthorized: status {status}")]
    Unauthorized { status: StatusCode },

    /// The server returned another non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if is_auth_failure(status) {
        return Err(ClientError::Unauthorized { status });
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}

/// Map the response to a stream subscription onto [`TransportError`].
async fn check_stream_response(
    resp: reqwest::Response,
) -> Result<reqwest::Response, TransportError> {
    let status = resp.status();
    if is_auth_failure(status) {
        return Err(TransportError::Unauthorized {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TransportError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}
