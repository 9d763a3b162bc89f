//! # Data Retrieval Module
//!
//! This module provides the HTTP plumbing shared by every backend call the
//! synchronization core makes.
//!
//! ## Purpose:
//! The gateway wrappers should only describe *what* they request and *what*
//! shape comes back. URL construction, JSON encoding, status checks, body
//! decoding and request tracing live here so they are written once.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: `ApiClient`, a thin wrapper over `reqwest_middleware`
//!   with base URL joining and JSON / text response helpers. It performs no
//!   retries: retry and staggering policy belongs to the callers.
//! - **`trace_middleware`**: a `reqwest_middleware::Middleware` that logs
//!   method, URL, status and latency of every request.
//! - **`error`**: `GatewayError`, the single remote error kind.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Error type for every failed backend exchange.
pub mod error;
/// Generic HTTP API client.
pub mod ky_http;
/// Request tracing middleware.
pub mod trace_middleware;

// --- Public API Re-exports ---
pub use error::GatewayError;
pub use ky_http::{ApiClient, ApiClientOptions, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use trace_middleware::RequestTracing;
