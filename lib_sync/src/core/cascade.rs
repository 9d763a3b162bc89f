//! # Selection Cascade
//!
//! Propagates selection changes down the dependency graph:
//!
//! ```text
//! vehicle ──► users ──► (efficiency target, average mileage)
//! ```
//!
//! Each `select_*` call mutates the store synchronously, before it returns,
//! and hands back a future that performs the dependent fetches. Dropping that
//! future only skips the fetch; the selection itself has already changed.
//! Responses carry the [`SelectionTag`] they were issued under and are
//! discarded if the selection has moved on in the meantime.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::state::{SelectionError, SelectionTag, Store};
use crate::gateway::{EfficiencyTargetUpdate, FleetGateway, UserId, VehicleId};

/// Selection state machine bound to a gateway.
#[derive(Clone)]
pub struct SelectionCascade {
    gateway: Arc<dyn FleetGateway>,
    store: Store,
}

impl SelectionCascade {
    /// Binds the cascade to `gateway`, writing into `store`.
    pub fn new(gateway: Arc<dyn FleetGateway>, store: Store) -> Self {
        Self { gateway, store }
    }

    /// Loads the vehicle list. A failure leaves an empty list behind.
    pub async fn load_vehicles(&self) -> usize {
        match self.gateway.list_vehicles().await {
            Ok(vehicles) => {
                let count = vehicles.len();
                self.store.update(|s| s.replace_vehicles(vehicles));
                info!(count, "vehicles loaded");
                count
            }
            Err(e) => {
                warn!(error = %e, "failed to load vehicles");
                self.store.update(|s| s.replace_vehicles(Vec::new()));
                0
            }
        }
    }

    /// Selects `vehicle_id`, clearing the user and everything scoped to the
    /// old pair. The returned future loads the vehicle's users.
    pub fn select_vehicle(&self, vehicle_id: VehicleId) -> impl Future<Output = ()> + Send + 'static {
        let tag = self.store.update(|s| s.select_vehicle(vehicle_id.clone()));
        debug!(%vehicle_id, "vehicle selected");

        let this = self.clone();
        async move { this.load_users(vehicle_id, tag).await }
    }

    async fn load_users(&self, vehicle_id: VehicleId, tag: SelectionTag) {
        match self.gateway.list_users(&vehicle_id).await {
            Ok(users) => {
                let count = users.len();
                if self.store.update(|s| s.apply_users(tag, users)) {
                    debug!(%vehicle_id, count, "users loaded");
                } else {
                    debug!(%vehicle_id, "discarding user list for a superseded vehicle");
                }
            }
            Err(e) => warn!(%vehicle_id, error = %e, "failed to load users"),
        }
    }

    /// Selects `user_id` under the current vehicle. The returned future loads
    /// the pair's efficiency target and average mileage concurrently.
    pub fn select_user(
        &self,
        user_id: UserId,
    ) -> Result<impl Future<Output = ()> + Send + 'static, SelectionError> {
        let (vehicle_id, tag) = self.store.update(|s| s.select_user(user_id.clone()))?;
        debug!(%vehicle_id, %user_id, "user selected");

        let this = self.clone();
        Ok(async move {
            tokio::join!(
                this.load_efficiency_target(&user_id, &vehicle_id, tag),
                this.load_average_mileage(&user_id, &vehicle_id, tag),
            );
        })
    }

    async fn load_efficiency_target(&self, user_id: &UserId, vehicle_id: &VehicleId, tag: SelectionTag) {
        match self.gateway.fetch_efficiency_target(user_id, vehicle_id).await {
            Ok(value) => {
                if !self.store.update(|s| s.apply_efficiency_target(tag, value)) {
                    debug!(%vehicle_id, %user_id, "discarding stale efficiency target");
                }
            }
            Err(e) => warn!(%vehicle_id, %user_id, error = %e, "failed to load efficiency target"),
        }
    }

    async fn load_average_mileage(&self, user_id: &UserId, vehicle_id: &VehicleId, tag: SelectionTag) -> bool {
        match self.gateway.fetch_average_mileage(user_id, vehicle_id).await {
            Ok(value) => {
                let applied = self.store.update(|s| s.apply_average_mileage(tag, value));
                if !applied {
                    debug!(%vehicle_id, %user_id, "discarding stale average mileage");
                }
                applied
            }
            Err(e) => {
                warn!(%vehicle_id, %user_id, error = %e, "failed to load average mileage");
                false
            }
        }
    }

    /// Sends `value` as the new target of the current pair. The future
    /// resolves to `true` once the server's echo has replaced the local value.
    pub fn update_efficiency_target(
        &self,
        value: f64,
    ) -> Result<impl Future<Output = bool> + Send + 'static, SelectionError> {
        if !value.is_finite() {
            return Err(SelectionError::InvalidTarget(value));
        }
        let (vehicle_id, user_id, tag) = self.store.read(|s| s.scoped_pair())?;
        let update = EfficiencyTargetUpdate::active(value, user_id, vehicle_id);

        let this = self.clone();
        Ok(async move {
            match this.gateway.update_efficiency_target(&update).await {
                Ok(echoed) => {
                    if echoed != value {
                        info!(requested = value, stored = echoed, "server adjusted efficiency target");
                    }
                    this.store.update(|s| s.apply_efficiency_target(tag, echoed))
                }
                Err(e) => {
                    warn!(
                        vehicle_id = %update.vehicle_id,
                        user_id = %update.user_id,
                        error = %e,
                        "failed to update efficiency target"
                    );
                    false
                }
            }
        })
    }

    /// Re-fetches the average mileage of the current pair.
    pub fn refresh_average_mileage(
        &self,
    ) -> Result<impl Future<Output = bool> + Send + 'static, SelectionError> {
        let (vehicle_id, user_id, tag) = self.store.read(|s| s.scoped_pair())?;
        let this = self.clone();
        Ok(async move { this.load_average_mileage(&user_id, &vehicle_id, tag).await })
    }

    /// Sets the mileage input used by the next publish.
    pub fn set_mileage_input(&self, value: f64) -> Result<(), SelectionError> {
        self.store.update(|s| s.set_mileage_input(value))
    }
}
