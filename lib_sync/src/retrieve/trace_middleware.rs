//! # Request Tracing Middleware
//!
//! Logs every outbound request with its method, URL, resulting status and
//! latency. Failures are logged at `warn`, everything else at `debug`, so a
//! backend that is intermittently unreachable shows up in the diagnostics
//! without surfacing in the UI.

use std::time::Instant;

use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::{debug, warn};

/// Middleware emitting one `tracing` event per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestTracing;

#[async_trait::async_trait]
impl Middleware for RequestTracing {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        let started = Instant::now();

        let result = next.run(req, extensions).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) if response.status().is_success() => {
                debug!(%method, %url, status = response.status().as_u16(), elapsed_ms, "request completed");
            }
            Ok(response) => {
                warn!(%method, %url, status = response.status().as_u16(), elapsed_ms, "request rejected by server");
            }
            Err(e) => {
                warn!(%method, %url, elapsed_ms, error = %e, "request failed");
            }
        }

        result
    }
}
