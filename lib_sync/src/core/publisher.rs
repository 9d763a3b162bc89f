//! # Mileage Publisher
//!
//! Sends one reading as a staggered burst of identical requests: one
//! immediately, then one per second until five have been sent. Each request
//! is independent, a failure only affects itself. The burst uses the reading
//! captured when `publish` was called, later selection or input changes do
//! not leak into requests that have not fired yet.
//!
//! Every acknowledgement carrying a message replaces the displayed
//! notification text (last completion wins) and is pushed to the sink.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::sink::{NotificationMessage, NotificationSink, NotificationSource};
use super::state::Store;
use crate::gateway::{FleetGateway, MileageReading};

/// Requests sent per publish.
pub const PUBLISH_BURST_SIZE: usize = 5;

/// Spacing between consecutive requests of a burst.
pub const PUBLISH_SPACING: Duration = Duration::from_secs(1);

/// What happened to one request of a burst.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// The server accepted the reading.
    Acknowledged {
        /// Position in the burst, starting at 0.
        attempt: usize,
        /// Non-blank server message, if any.
        message: Option<String>,
    },
    /// The request failed; the rest of the burst is unaffected.
    Failed {
        /// Position in the burst, starting at 0.
        attempt: usize,
        /// Rendered error.
        error: String,
    },
    /// Shutdown happened before the request fired.
    Cancelled {
        /// Position in the burst, starting at 0.
        attempt: usize,
    },
}

/// Burst sender bound to a gateway.
#[derive(Clone)]
pub struct MileagePublisher {
    gateway: Arc<dyn FleetGateway>,
    store: Store,
    sink: Arc<dyn NotificationSink>,
}

impl MileagePublisher {
    /// Binds the publisher to `gateway`.
    pub fn new(gateway: Arc<dyn FleetGateway>, store: Store, sink: Arc<dyn NotificationSink>) -> Self {
        Self { gateway, store, sink }
    }

    /// Schedules the burst and returns immediately.
    ///
    /// Requests that have not fired when `shutdown` is cancelled are skipped.
    /// Requests already in flight run to completion.
    pub fn publish(&self, reading: MileageReading, shutdown: &CancellationToken) -> PublishBurst {
        info!(
            vehicle_id = %reading.vehicle_id,
            user_id = %reading.user_id,
            value = reading.value,
            "publishing mileage"
        );

        let reading = Arc::new(reading);
        let started = Instant::now();
        let tasks = (0..PUBLISH_BURST_SIZE)
            .map(|attempt| {
                let this = self.clone();
                let reading = Arc::clone(&reading);
                let shutdown = shutdown.clone();
                let fire_at = started + PUBLISH_SPACING * attempt as u32;
                tokio::spawn(async move { this.send_at(attempt, fire_at, &reading, shutdown).await })
            })
            .collect();

        PublishBurst { reading, tasks }
    }

    async fn send_at(
        &self,
        attempt: usize,
        fire_at: Instant,
        reading: &MileageReading,
        shutdown: CancellationToken,
    ) -> PublishOutcome {
        let fired = if fire_at <= Instant::now() {
            !shutdown.is_cancelled()
        } else {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => false,
                _ = time::sleep_until(fire_at) => true,
            }
        };
        if !fired {
            debug!(attempt, "publish cancelled before firing");
            return PublishOutcome::Cancelled { attempt };
        }

        match self.gateway.publish_mileage(reading).await {
            Ok(ack) => {
                let message = ack.into_text();
                if let Some(text) = &message {
                    self.store.update(|s| s.set_notification_text(text.clone()));
                    self.sink
                        .push(NotificationMessage::new(text.clone(), NotificationSource::Publish));
                }
                debug!(attempt, "mileage acknowledged");
                PublishOutcome::Acknowledged { attempt, message }
            }
            Err(e) => {
                warn!(attempt, vehicle_id = %reading.vehicle_id, error = %e, "mileage publish failed");
                PublishOutcome::Failed {
                    attempt,
                    error: e.to_string(),
                }
            }
        }
    }
}

/// The scheduled requests of one publish.
///
/// Dropping the burst does not stop it.
#[derive(Debug)]
pub struct PublishBurst {
    reading: Arc<MileageReading>,
    tasks: Vec<JoinHandle<PublishOutcome>>,
}

impl PublishBurst {
    /// The reading every request of the burst sends.
    pub fn reading(&self) -> &MileageReading {
        &self.reading
    }

    /// Number of scheduled requests.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Always `false` for a burst built by [`MileagePublisher::publish`].
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every request and returns their outcomes in burst order.
    pub async fn join(self) -> Vec<PublishOutcome> {
        join_all(self.tasks)
            .await
            .into_iter()
            .enumerate()
            .map(|(attempt, joined)| {
                joined.unwrap_or_else(|e| PublishOutcome::Failed {
                    attempt,
                    error: format!("publish task aborted: {e}"),
                })
            })
            .collect()
    }
}
