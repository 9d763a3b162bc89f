//! # Notification Poller
//!
//! A self-scheduling loop that asks the backend for a notification of the
//! currently selected (vehicle, user) pair every five seconds and forwards any
//! non-blank message to the [`NotificationSink`].
//!
//! ## Key Design Principles:
//! - **Fixed Cadence**: The first tick fires immediately, then one request per
//!   interval whether or not earlier responses have arrived. Responses are
//!   delivered in completion order.
//! - **Live Pair**: The pair is read from the store at every tick, so a
//!   selection change is picked up without restarting. The engine still
//!   restarts the loop on selection changes so a response for the old pair
//!   is never delivered.
//! - **Resilience**: A failed request is logged and the loop carries on. It is
//!   neither retried early nor does it stop polling.
//! - **Cancellation**: The loop owns a child of the engine's shutdown token.
//!   Once cancelled, no further request is issued. Requests already in
//!   flight complete in the background and their results are discarded.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use super::sink::{NotificationMessage, NotificationSink, NotificationSource};
use super::state::Store;
use crate::gateway::{FleetGateway, NotificationPayload, UserId, VehicleId};
use crate::retrieve::GatewayError;

/// Time between two notification requests.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

type PollResult = (VehicleId, UserId, Result<NotificationPayload, GatewayError>);

/// # Notification Poller
///
/// Cheap to clone; every [`start`](Self::start) spawns an independent loop.
#[derive(Clone)]
pub struct NotificationPoller {
    gateway: Arc<dyn FleetGateway>,
    store: Store,
    sink: Arc<dyn NotificationSink>,
    interval: Duration,
}

impl NotificationPoller {
    /// A poller with the default [`POLL_INTERVAL`].
    pub fn new(gateway: Arc<dyn FleetGateway>, store: Store, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            gateway,
            store,
            sink,
            interval: POLL_INTERVAL,
        }
    }

    /// Overrides the interval between requests.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawns the polling loop under a child of `parent`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, parent: &CancellationToken) -> PollerHandle {
        let token = parent.child_token();
        let task = tokio::spawn(self.clone().run(token.clone()));
        PollerHandle { token, task }
    }

    async fn run(self, token: CancellationToken) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(interval_ms = self.interval.as_millis() as u64, "notification poller started");

        let mut in_flight: JoinSet<PollResult> = JoinSet::new();
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => match joined {
                    Ok((vehicle_id, user_id, result)) => self.deliver(&vehicle_id, &user_id, result),
                    Err(e) => error!(error = %e, "notification request task failed"),
                },
                _ = ticker.tick() => {
                    let Some((vehicle_id, user_id)) = self.store.read(|s| s.subscription()) else {
                        trace!("no complete selection, skipping notification poll");
                        continue;
                    };
                    let gateway = Arc::clone(&self.gateway);
                    in_flight.spawn(async move {
                        let result = gateway.poll_notification(&vehicle_id, &user_id).await;
                        (vehicle_id, user_id, result)
                    });
                }
            }
        }

        // Requests already sent finish on their own, only their results are dropped.
        in_flight.detach_all();
        debug!("notification poller stopped");
    }

    fn deliver(
        &self,
        vehicle_id: &VehicleId,
        user_id: &UserId,
        result: Result<NotificationPayload, GatewayError>,
    ) {
        match result {
            Ok(payload) => match payload.into_text() {
                Some(text) => {
                    debug!(%vehicle_id, %user_id, "notification received");
                    self.sink.push(NotificationMessage::new(text, NotificationSource::Poll));
                }
                None => trace!(%vehicle_id, %user_id, "no notification"),
            },
            Err(e) => warn!(%vehicle_id, %user_id, error = %e, "notification poll failed"),
        }
    }
}

/// # Poller Handle
///
/// Owns a running polling loop. Dropping the handle cancels the loop; use
/// [`shutdown`](Self::shutdown) to also wait for it to wind down.
#[derive(Debug)]
pub struct PollerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Requests cancellation without waiting.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the loop and waits for the task to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Err(e) = (&mut self.task).await {
            if e.is_panic() {
                error!(error = %e, "notification poller panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
