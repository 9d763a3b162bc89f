//! # Remote Service Gateway
//!
//! Typed request/response wrappers for every endpoint of the telemetry
//! backend. The gateway is stateless: no retries, no caching. Timing policy
//! (poll intervals, publish bursts) and race handling belong to the callers
//! in [`crate::core`].
//!
//! ## Contained Modules:
//!
//! - **`models`**: wire types (vehicles, users, targets, readings and the
//!   small response envelopes).
//! - **`fleet_api`**: the `FleetGateway` trait seam and its HTTP
//!   implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The gateway trait and its reqwest-backed implementation.
pub mod fleet_api;
/// Wire types shared by the gateway and the core.
pub mod models;

// --- Public API Re-exports ---
pub use fleet_api::{FleetGateway, HttpFleetGateway};
pub use models::{
    EfficiencyTargetUpdate, MileageReading, NotificationPayload, PublishAck, User, UserId,
    Vehicle, VehicleId, EFFICIENCY_STATUS_ACTIVE,
};
