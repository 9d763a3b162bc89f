//! # Selection State Store
//!
//! The single source of truth for everything the presentation layer renders:
//! the root `SelectionState` plus the entities derived from it.
//!
//! ## Field ownership
//! - vehicles: written only by the cascade's vehicle load.
//! - selection, users, efficiency target, average mileage: written only by
//!   the selection cascade.
//! - notification text: written only by the mileage publisher.
//!
//! ## Stale responses
//! Every scoped fetch captures a [`SelectionTag`] when it is issued. A vehicle
//! change bumps both epochs, a user change bumps the user epoch. Responses
//! whose tag is no longer current are discarded instead of applied.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::watch;

use crate::gateway::{MileageReading, User, UserId, Vehicle, VehicleId};

/// Mileage shown in the input before the operator types anything.
pub const DEFAULT_MILEAGE_INPUT: f64 = 5.0;

/// A local precondition failure. State is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    /// The operation needs a selected vehicle.
    #[error("no vehicle selected")]
    VehicleNotSelected,
    /// The operation needs a selected user.
    #[error("no user selected")]
    UserNotSelected,
    /// Mileage input must be finite and non-negative.
    #[error("mileage must be a finite, non-negative number (got {0})")]
    InvalidMileage(f64),
    /// Efficiency targets must be finite.
    #[error("efficiency target must be a finite number (got {0})")]
    InvalidTarget(f64),
}

/// Identifies the selection a scoped request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTag {
    vehicle_epoch: u64,
    user_epoch: u64,
}

/// The root selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    /// Currently selected vehicle.
    pub selected_vehicle_id: Option<VehicleId>,
    /// Currently selected user (only ever set while a vehicle is selected).
    pub selected_user_id: Option<UserId>,
    /// Value of the mileage input field.
    pub current_mileage_input: f64,
}

/// Efficiency target for an owner pair.
#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyTarget {
    /// Server-authoritative value.
    pub value: f64,
    /// User the target belongs to.
    pub owner_user_id: UserId,
    /// Vehicle the target belongs to.
    pub owner_vehicle_id: VehicleId,
}

/// Average mileage for an owner pair, as formatted by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageMileage {
    /// Server-formatted numeric text.
    pub value: String,
    /// User the average belongs to.
    pub owner_user_id: UserId,
    /// Vehicle the average belongs to.
    pub owner_vehicle_id: VehicleId,
}

/// Everything a renderer needs, detached from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    /// Selectable vehicles.
    pub vehicles: Vec<Vehicle>,
    /// Users of the selected vehicle.
    pub users: Vec<User>,
    /// Selected vehicle, if any.
    pub selected_vehicle_id: Option<VehicleId>,
    /// Selected user, if any.
    pub selected_user_id: Option<UserId>,
    /// Mileage input value.
    pub mileage_input: f64,
    /// Efficiency target of the current pair, if loaded.
    pub efficiency_target: Option<f64>,
    /// Average mileage of the current pair, if loaded.
    pub average_mileage: Option<String>,
    /// Last message returned by a publish.
    pub notification_text: Option<String>,
}

/// Root state plus derived entities. Mutated only through [`Store::update`].
#[derive(Debug)]
pub struct SyncState {
    vehicles: Vec<Vehicle>,
    users: Vec<User>,
    selection: SelectionState,
    efficiency_target: Option<EfficiencyTarget>,
    average_mileage: Option<AverageMileage>,
    notification_text: Option<String>,
    vehicle_epoch: u64,
    user_epoch: u64,
}

impl SyncState {
    /// Empty state with the given mileage input.
    pub fn new(default_mileage: f64) -> Self {
        Self {
            vehicles: Vec::new(),
            users: Vec::new(),
            selection: SelectionState {
                selected_vehicle_id: None,
                selected_user_id: None,
                current_mileage_input: default_mileage,
            },
            efficiency_target: None,
            average_mileage: None,
            notification_text: None,
            vehicle_epoch: 0,
            user_epoch: 0,
        }
    }

    /// The current selection.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Tag for a request issued right now.
    pub fn tag(&self) -> SelectionTag {
        SelectionTag {
            vehicle_epoch: self.vehicle_epoch,
            user_epoch: self.user_epoch,
        }
    }

    /// Whether a response tagged `tag` still matches the selection.
    pub fn is_current(&self, tag: SelectionTag) -> bool {
        self.tag() == tag
    }

    /// Replaces the vehicle collection wholesale.
    pub fn replace_vehicles(&mut self, vehicles: Vec<Vehicle>) {
        self.vehicles = vehicles;
    }

    /// Selects a vehicle and invalidates every dependent entity.
    pub fn select_vehicle(&mut self, vehicle_id: VehicleId) -> SelectionTag {
        self.vehicle_epoch += 1;
        self.user_epoch += 1;
        self.selection.selected_vehicle_id = Some(vehicle_id);
        self.selection.selected_user_id = None;
        self.users.clear();
        self.efficiency_target = None;
        self.average_mileage = None;
        self.tag()
    }

    /// Applies a user list fetched under `tag`. Returns `false` when stale.
    ///
    /// Only the vehicle epoch matters: a user picked while the list was in
    /// flight does not make the list itself stale.
    pub fn apply_users(&mut self, tag: SelectionTag, users: Vec<User>) -> bool {
        if tag.vehicle_epoch != self.vehicle_epoch {
            return false;
        }
        self.users = users;
        true
    }

    /// Selects a user of the current vehicle and invalidates its target and
    /// average. Returns the vehicle the user is scoped to.
    pub fn select_user(&mut self, user_id: UserId) -> Result<(VehicleId, SelectionTag), SelectionError> {
        let vehicle_id = self
            .selection
            .selected_vehicle_id
            .clone()
            .ok_or(SelectionError::VehicleNotSelected)?;

        self.user_epoch += 1;
        self.selection.selected_user_id = Some(user_id);
        self.efficiency_target = None;
        self.average_mileage = None;
        Ok((vehicle_id, self.tag()))
    }

    /// The complete (vehicle, user) pair with its tag.
    pub fn scoped_pair(&self) -> Result<(VehicleId, UserId, SelectionTag), SelectionError> {
        let vehicle_id = self
            .selection
            .selected_vehicle_id
            .clone()
            .ok_or(SelectionError::VehicleNotSelected)?;
        let user_id = self
            .selection
            .selected_user_id
            .clone()
            .ok_or(SelectionError::UserNotSelected)?;
        Ok((vehicle_id, user_id, self.tag()))
    }

    /// The (vehicle, user) pair notifications are keyed by, if complete.
    pub fn subscription(&self) -> Option<(VehicleId, UserId)> {
        self.scoped_pair().ok().map(|(v, u, _)| (v, u))
    }

    /// Applies an efficiency target fetched or echoed under `tag`.
    pub fn apply_efficiency_target(&mut self, tag: SelectionTag, value: f64) -> bool {
        let Some((vehicle_id, user_id)) = self.current_owner(tag) else {
            return false;
        };
        self.efficiency_target = Some(EfficiencyTarget {
            value,
            owner_user_id: user_id,
            owner_vehicle_id: vehicle_id,
        });
        true
    }

    /// Applies an average mileage fetched under `tag`.
    pub fn apply_average_mileage(&mut self, tag: SelectionTag, value: String) -> bool {
        let Some((vehicle_id, user_id)) = self.current_owner(tag) else {
            return false;
        };
        self.average_mileage = Some(AverageMileage {
            value,
            owner_user_id: user_id,
            owner_vehicle_id: vehicle_id,
        });
        true
    }

    fn current_owner(&self, tag: SelectionTag) -> Option<(VehicleId, UserId)> {
        if !self.is_current(tag) {
            return None;
        }
        self.subscription()
    }

    /// Sets the mileage input.
    pub fn set_mileage_input(&mut self, value: f64) -> Result<(), SelectionError> {
        if !value.is_finite() || value < 0.0 {
            return Err(SelectionError::InvalidMileage(value));
        }
        self.selection.current_mileage_input = value;
        Ok(())
    }

    /// Snapshot of the reading to publish for the current selection.
    pub fn reading(&self) -> Result<MileageReading, SelectionError> {
        let (vehicle_id, user_id, _) = self.scoped_pair()?;
        Ok(MileageReading {
            vehicle_id,
            user_id,
            value: self.selection.current_mileage_input,
        })
    }

    /// Replaces the displayed notification text.
    pub fn set_notification_text(&mut self, text: String) {
        self.notification_text = Some(text);
    }

    /// Detached view. Entities whose owners no longer match the selection are
    /// reported as absent.
    pub fn snapshot(&self) -> ViewSnapshot {
        let owner = self.subscription();
        let owned_by_selection = |user: &UserId, vehicle: &VehicleId| {
            owner
                .as_ref()
                .is_some_and(|(v, u)| v == vehicle && u == user)
        };

        ViewSnapshot {
            vehicles: self.vehicles.clone(),
            users: self.users.clone(),
            selected_vehicle_id: self.selection.selected_vehicle_id.clone(),
            selected_user_id: self.selection.selected_user_id.clone(),
            mileage_input: self.selection.current_mileage_input,
            efficiency_target: self
                .efficiency_target
                .as_ref()
                .filter(|t| owned_by_selection(&t.owner_user_id, &t.owner_vehicle_id))
                .map(|t| t.value),
            average_mileage: self
                .average_mileage
                .as_ref()
                .filter(|a| owned_by_selection(&a.owner_user_id, &a.owner_vehicle_id))
                .map(|a| a.value.clone()),
            notification_text: self.notification_text.clone(),
        }
    }
}

/// Shared handle on the [`SyncState`] with a re-render signal.
///
/// The lock is only held inside the closures passed to [`Store::read`] and
/// [`Store::update`], never across an await point.
#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<SyncState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Store {
    /// A store holding fresh state.
    pub fn new(default_mileage: f64) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(SyncState::new(default_mileage))),
            revision: Arc::new(revision),
        }
    }

    /// Runs `f` against the state without signalling a change.
    pub fn read<R>(&self, f: impl FnOnce(&SyncState) -> R) -> R {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Runs `f` against the state and bumps the revision.
    pub fn update<R>(&self, f: impl FnOnce(&mut SyncState) -> R) -> R {
        let result = {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        };
        self.revision.send_modify(|rev| *rev += 1);
        result
    }

    /// Detached view of the current state.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.read(SyncState::snapshot)
    }

    /// Receiver that changes whenever the state may have changed.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("revision", &*self.revision.borrow())
            .finish_non_exhaustive()
    }
}
