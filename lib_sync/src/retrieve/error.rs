//! # Gateway Errors
//!
//! Every failed exchange with the backend is reported as a `GatewayError`.
//! Callers never propagate it further than the component that issued the
//! request: it is logged and degrades the view to "absent data".

use thiserror::Error;

/// Maximum number of body bytes kept in an error for diagnostics.
const BODY_EXCERPT_LIMIT: usize = 512;

/// A failed request / response exchange.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The endpoint URL could not be built from the base URL.
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    /// The configured base URL cannot carry path segments (e.g. `mailto:`).
    #[error("base url cannot be used for api paths: {0}")]
    CannotBeABase(String),

    /// The HTTP client itself could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS, timeout or middleware failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server returned status {status}: {body}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Excerpt of the error body returned by the server.
        body: String,
    },

    /// The body was not the JSON shape the endpoint promises.
    #[error("malformed response body ({source}): {body}")]
    Decode {
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
        /// Excerpt of the offending body.
        body: String,
    },

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl GatewayError {
    /// Builds a `Status` error, truncating the body to a loggable size.
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: excerpt(body),
        }
    }

    /// Builds a `Decode` error, truncating the body to a loggable size.
    pub fn decode(source: serde_json::Error, body: &str) -> Self {
        Self::Decode {
            source,
            body: excerpt(body),
        }
    }

    /// HTTP status of the failure, when the server produced one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
