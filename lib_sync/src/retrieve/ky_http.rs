//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous API client wrapper around `reqwest`.
//! It joins endpoint paths onto a base URL, encodes JSON bodies, rejects
//! non-2xx responses and decodes JSON or plain-text bodies.
//!
//! Unlike a general purpose client it deliberately performs no retries: the
//! components calling it own their timing (poll intervals, publish bursts).

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use super::error::GatewayError;
use super::trace_middleware::RequestTracing;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("mileage-sync/", env!("CARGO_PKG_VERSION"));

/// Construction options for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiClientOptions {
    /// Upper bound for a whole request, connect to last body byte.
    pub timeout: Duration,
    /// Value sent in the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ApiClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A flexible asynchronous HTTP client.
///
/// Built on top of `reqwest_middleware`, it handles the base URL and traces
/// every request through [`RequestTracing`].
#[derive(Clone)]
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which all endpoint segments are appended.
    base_url: Url,
}

impl ApiClient {
    /// Creates a new `ApiClient`.
    ///
    /// # Arguments
    /// * `base_url` - Absolute base URL of the backend (e.g. `http://localhost:8080/`).
    ///   A path prefix is kept: `http://host/backend` yields `http://host/backend/api/...`.
    /// * `options` - Timeout and user agent.
    pub fn new(base_url: &str, options: &ApiClientOptions) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::CannotBeABase(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(GatewayError::Client)?;

        let inner = ClientBuilder::new(client).with(RequestTracing).build();

        Ok(Self { inner, base_url })
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL from raw path segments and query pairs.
    ///
    /// Segments are percent-encoded individually, so opaque ids containing
    /// `/`, spaces or `?` cannot change the route.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::CannotBeABase(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    /// `GET` an endpoint and decode its JSON body.
    pub async fn get_json<T>(&self, url: Url) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        let body = self.execute::<()>(Method::GET, url, None).await?;
        decode_json(&body)
    }

    /// `GET` an endpoint whose body is plain text.
    pub async fn get_text(&self, url: Url) -> Result<String, GatewayError> {
        self.execute::<()>(Method::GET, url, None).await
    }

    /// Sends a JSON body with `method` and decodes the JSON response.
    pub async fn send_json<T, B>(&self, method: Method, url: Url, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let text = self.execute(method, url, Some(body)).await?;
        decode_json(&text)
    }

    /// Executes one request and returns the raw body of a 2xx response.
    async fn execute<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<String, GatewayError>
    where
        B: Serialize + ?Sized,
    {
        let mut req = self
            .inner
            .request(method, url)
            .header(ACCEPT, "application/json, text/plain, */*");

        if let Some(b) = body {
            let json_body = serde_json::to_string(b).map_err(GatewayError::Encode)?;
            req = req.header(CONTENT_TYPE, "application/json").body(json_body);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await.map_err(GatewayError::Body)?;

        if !status.is_success() {
            return Err(GatewayError::status(status.as_u16(), &text));
        }

        Ok(text)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|e| GatewayError::decode(e, body))
}
