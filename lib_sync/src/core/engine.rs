//! # Sync Engine
//!
//! Facade wiring the store, the selection cascade, the notification poller and
//! the mileage publisher behind the operations a presentation layer invokes.
//!
//! ## Lifecycle
//! 1. [`SyncEngine::activate`] starts the poller and loads vehicles.
//! 2. Selection, target and publish operations run while active.
//! 3. [`SyncEngine::shutdown`] cancels the poller and every publish request
//!    that has not fired yet. The engine is not reusable afterwards.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cascade::SelectionCascade;
use super::poller::{NotificationPoller, PollerHandle, POLL_INTERVAL};
use super::publisher::{MileagePublisher, PublishBurst};
use super::sink::NotificationSink;
use super::state::{SelectionError, Store, ViewSnapshot, DEFAULT_MILEAGE_INPUT};
use crate::gateway::{FleetGateway, MileageReading, UserId, VehicleId};

/// Construction knobs for a [`SyncEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    /// Initial mileage input.
    pub default_mileage: f64,
    /// Notification poll interval.
    pub poll_interval: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_mileage: DEFAULT_MILEAGE_INPUT,
            poll_interval: POLL_INTERVAL,
        }
    }
}

/// The synchronization core. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct SyncEngine {
    store: Store,
    cascade: SelectionCascade,
    poller: NotificationPoller,
    publisher: MileagePublisher,
    active_poll: Arc<Mutex<Option<PollerHandle>>>,
    shutdown: CancellationToken,
}

impl SyncEngine {
    /// Engine with default options.
    pub fn new(gateway: Arc<dyn FleetGateway>, sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_options(gateway, sink, EngineOptions::default())
    }

    /// Engine with explicit options.
    pub fn with_options(
        gateway: Arc<dyn FleetGateway>,
        sink: Arc<dyn NotificationSink>,
        options: EngineOptions,
    ) -> Self {
        let store = Store::new(options.default_mileage);
        Self {
            cascade: SelectionCascade::new(Arc::clone(&gateway), store.clone()),
            poller: NotificationPoller::new(Arc::clone(&gateway), store.clone(), Arc::clone(&sink))
                .with_interval(options.poll_interval),
            publisher: MileagePublisher::new(gateway, store.clone(), sink),
            store,
            active_poll: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Starts notification polling and returns the vehicle load.
    ///
    /// After [`shutdown`](Self::shutdown) polling is not started again.
    pub fn activate(&self) -> impl Future<Output = usize> + Send + 'static {
        {
            let mut slot = self.poll_slot();
            if self.shutdown.is_cancelled() {
                warn!("sync engine is shut down, polling not started");
            } else if slot.is_none() {
                *slot = Some(self.poller.start(&self.shutdown));
                info!("sync engine activated");
            }
        }
        let cascade = self.cascade.clone();
        async move { cascade.load_vehicles().await }
    }

    /// Stops notification polling. Selection state is kept.
    pub fn deactivate(&self) {
        if let Some(handle) = self.poll_slot().take() {
            handle.cancel();
            info!("sync engine deactivated");
        }
    }

    /// Whether notification polling is running.
    pub fn is_active(&self) -> bool {
        self.poll_slot().is_some()
    }

    /// Reloads the vehicle list.
    pub async fn load_vehicles(&self) -> usize {
        self.cascade.load_vehicles().await
    }

    /// Selects a vehicle. See [`SelectionCascade::select_vehicle`].
    pub fn select_vehicle(&self, vehicle_id: VehicleId) -> impl Future<Output = ()> + Send + 'static {
        let fetch = self.cascade.select_vehicle(vehicle_id);
        self.restart_polling();
        fetch
    }

    /// Selects a user. See [`SelectionCascade::select_user`].
    pub fn select_user(
        &self,
        user_id: UserId,
    ) -> Result<impl Future<Output = ()> + Send + 'static, SelectionError> {
        let fetch = self.cascade.select_user(user_id)?;
        self.restart_polling();
        Ok(fetch)
    }

    /// Sets the mileage input.
    pub fn set_mileage_input(&self, value: f64) -> Result<(), SelectionError> {
        self.cascade.set_mileage_input(value)
    }

    /// Updates the efficiency target of the current pair.
    pub fn update_efficiency_target(
        &self,
        value: f64,
    ) -> Result<impl Future<Output = bool> + Send + 'static, SelectionError> {
        self.cascade.update_efficiency_target(value)
    }

    /// Re-fetches the average mileage of the current pair.
    pub fn refresh_average_mileage(
        &self,
    ) -> Result<impl Future<Output = bool> + Send + 'static, SelectionError> {
        self.cascade.refresh_average_mileage()
    }

    /// Publishes the mileage input for the current pair.
    pub fn publish(&self) -> Result<PublishBurst, SelectionError> {
        let reading = self.store.read(|s| s.reading())?;
        Ok(self.publish_reading(reading))
    }

    /// Publishes an explicit reading, independent of the selection.
    pub fn publish_reading(&self, reading: MileageReading) -> PublishBurst {
        self.publisher.publish(reading, &self.shutdown)
    }

    /// Detached view of the current state.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.store.snapshot()
    }

    /// Change signal for re-rendering.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Cancels polling and pending publish requests, then waits for the
    /// poller to exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self.poll_slot().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
        info!("sync engine shut down");
    }

    fn restart_polling(&self) {
        let mut slot = self.poll_slot();
        if let Some(previous) = slot.take() {
            previous.cancel();
            *slot = Some(self.poller.start(&self.shutdown));
            debug!("notification poller restarted for new selection");
        }
    }

    fn poll_slot(&self) -> std::sync::MutexGuard<'_, Option<PollerHandle>> {
        self.active_poll.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("store", &self.store)
            .field("active", &self.is_active())
            .field("shut_down", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}
