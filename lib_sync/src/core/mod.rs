//! # Synchronization Core
//!
//! ## Purpose:
//! Holds the selection state and keeps every derived entity consistent with
//! it while talking to the backend through a [`crate::gateway::FleetGateway`].
//!
//! ## Contained Modules:
//!
//! - **`state`**: the selection store, stale-response tags and view snapshots.
//! - **`cascade`**: vehicle ► users ► target/average propagation.
//! - **`poller`**: the five-second notification loop.
//! - **`publisher`**: the staggered five-request mileage burst.
//! - **`sink`**: toast delivery to the presentation layer.
//! - **`engine`**: the facade tying the above together.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Selection cascade.
pub mod cascade;
/// Engine facade.
pub mod engine;
/// Notification polling loop.
pub mod poller;
/// Mileage burst publisher.
pub mod publisher;
/// Notification sink.
pub mod sink;
/// State store.
pub mod state;

// --- Public API Re-exports ---
pub use cascade::SelectionCascade;
pub use engine::{EngineOptions, SyncEngine};
pub use poller::{NotificationPoller, PollerHandle, POLL_INTERVAL};
pub use publisher::{
    MileagePublisher, PublishBurst, PublishOutcome, PUBLISH_BURST_SIZE, PUBLISH_SPACING,
};
pub use sink::{ChannelSink, NotificationMessage, NotificationSink, NotificationSource};
pub use state::{SelectionError, SelectionState, Store, ViewSnapshot, DEFAULT_MILEAGE_INPUT};
