//! # lib_sync
//!
//! Client-side synchronization core for the mileage telemetry UI. The crate
//! owns everything with temporal or ordering behaviour behind the screens:
//!
//! - **`retrieve`**: the reqwest-based HTTP client the gateway is built on.
//! - **`gateway`**: typed wrappers for every backend endpoint.
//! - **`core`**: the state store, the vehicle → user → target/average cascade,
//!   the notification poller, the staggered mileage publisher and the
//!   `SyncEngine` facade that wires them together.
//! - **`configs`** / **`loggers`** (feature gated): settings and logging setup
//!   for front-ends.
//!
//! Rendering is left to the caller: a presentation layer reads
//! [`crate::core::ViewSnapshot`]s, listens on [`crate::core::SyncEngine::subscribe`] for
//! re-render hints and receives toasts through a [`crate::core::NotificationSink`].

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Typed wrappers for the telemetry backend endpoints.
pub mod gateway;
/// Generic HTTP client with request tracing.
pub mod retrieve;
/// State store, selection cascade, poller, publisher and engine.
pub mod core;

/// Validated runtime settings.
#[cfg(feature = "configs")]
pub mod configs;
/// Logging setup on top of `tracing-subscriber`.
#[cfg(feature = "loggers")]
pub mod loggers;

// --- Public API Re-exports ---
pub use crate::core::{
    ChannelSink, EngineOptions, NotificationMessage, NotificationSink, NotificationSource,
    PublishBurst, PublishOutcome, SelectionError, SyncEngine, ViewSnapshot,
};
pub use gateway::{FleetGateway, HttpFleetGateway};
pub use retrieve::GatewayError;
