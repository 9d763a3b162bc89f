//! Scripted in-memory backend and a recording sink shared by the
//! integration tests. All delays run on Tokio's clock, so tests using
//! `start_paused = true` are deterministic.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use lib_sync::gateway::{
    EfficiencyTargetUpdate, FleetGateway, MileageReading, NotificationPayload, PublishAck, User,
    UserId, Vehicle, VehicleId,
};
use lib_sync::{EngineOptions, GatewayError, NotificationMessage, NotificationSink, SyncEngine};

/// One request the fake received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListVehicles,
    ListUsers(String),
    FetchTarget { user: String, vehicle: String },
    UpdateTarget(EfficiencyTargetUpdate),
    FetchAverage { user: String, vehicle: String },
    Publish(MileageReading),
    Poll { vehicle: String, user: String },
}

/// Reply to one publish request.
#[derive(Debug, Clone)]
pub struct PublishReply {
    pub delay: Duration,
    pub result: Result<Option<String>, u16>,
}

impl PublishReply {
    pub fn ok(message: &str) -> Self {
        Self { delay: Duration::ZERO, result: Ok(Some(message.to_string())) }
    }

    pub fn failed(status: u16) -> Self {
        Self { delay: Duration::ZERO, result: Err(status) }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// What the fake answers.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub vehicles: Vec<Vehicle>,
    pub fail_vehicles: bool,
    /// Users and response delay per vehicle id.
    pub users: HashMap<String, (Duration, Vec<User>)>,
    /// Target and response delay per user id.
    pub targets: HashMap<String, (Duration, f64)>,
    /// Upper bound the server clamps updated targets to.
    pub target_ceiling: Option<f64>,
    /// Average and response delay per user id.
    pub averages: HashMap<String, (Duration, String)>,
    /// Consumed in call order; once empty every publish gets `default_publish`.
    pub publish_replies: VecDeque<PublishReply>,
    pub default_publish: Option<String>,
    pub notification: Option<String>,
    /// The first `failing_polls` polls answer 503.
    pub failing_polls: usize,
    /// How long every poll takes to answer.
    pub poll_delay: Duration,
}

impl Script {
    /// Two vehicles with two users each, all answers immediate.
    pub fn fleet() -> Self {
        let mut script = Self {
            vehicles: vec![vehicle("v1", "Sedan"), vehicle("v2", "Van")],
            default_publish: Some("Mileage recorded".to_string()),
            ..Default::default()
        };
        script.users.insert("v1".into(), (Duration::ZERO, vec![user("u1", "Dana"), user("u2", "Eli")]));
        script.users.insert("v2".into(), (Duration::ZERO, vec![user("u3", "Fay")]));
        for (id, target, average) in [("u1", 8.0, "6.5"), ("u2", 9.0, "7.25"), ("u3", 4.0, "3.0")] {
            script.targets.insert(id.into(), (Duration::ZERO, target));
            script.averages.insert(id.into(), (Duration::ZERO, average.to_string()));
        }
        script
    }
}

pub fn vehicle(id: &str, name: &str) -> Vehicle {
    Vehicle { id: id.into(), display_name: name.to_string() }
}

pub fn user(id: &str, name: &str) -> User {
    User { id: id.into(), display_name: name.to_string() }
}

pub struct FakeGateway {
    script: Mutex<Script>,
    calls: Mutex<Vec<(Instant, Call)>>,
    polls_seen: Mutex<usize>,
}

impl FakeGateway {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
            polls_seen: Mutex::new(0),
        })
    }

    pub fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<(Instant, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn publishes(&self) -> Vec<(Instant, MileageReading)> {
        self.calls()
            .into_iter()
            .filter_map(|(at, call)| match call {
                Call::Publish(reading) => Some((at, reading)),
                _ => None,
            })
            .collect()
    }

    pub fn polls(&self) -> Vec<(Instant, String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|(at, call)| match call {
                Call::Poll { vehicle, user } => Some((at, vehicle, user)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|(_, call)| matches(call)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }
}

fn unavailable(status: u16) -> GatewayError {
    GatewayError::status(status, "scripted failure")
}

#[async_trait]
impl FleetGateway for FakeGateway {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, GatewayError> {
        self.record(Call::ListVehicles);
        let script = self.script();
        if script.fail_vehicles {
            return Err(unavailable(500));
        }
        Ok(script.vehicles.clone())
    }

    async fn list_users(&self, vehicle_id: &VehicleId) -> Result<Vec<User>, GatewayError> {
        self.record(Call::ListUsers(vehicle_id.to_string()));
        let entry = self.script().users.get(vehicle_id.as_str()).cloned();
        let (delay, users) = entry.ok_or_else(|| unavailable(404))?;
        sleep(delay).await;
        Ok(users)
    }

    async fn fetch_efficiency_target(
        &self,
        user_id: &UserId,
        vehicle_id: &VehicleId,
    ) -> Result<f64, GatewayError> {
        self.record(Call::FetchTarget { user: user_id.to_string(), vehicle: vehicle_id.to_string() });
        let entry = self.script().targets.get(user_id.as_str()).cloned();
        let (delay, value) = entry.ok_or_else(|| unavailable(404))?;
        sleep(delay).await;
        Ok(value)
    }

    async fn update_efficiency_target(
        &self,
        update: &EfficiencyTargetUpdate,
    ) -> Result<f64, GatewayError> {
        self.record(Call::UpdateTarget(update.clone()));
        let ceiling = self.script().target_ceiling;
        Ok(match ceiling {
            Some(max) => update.efficient_target_value.min(max),
            None => update.efficient_target_value,
        })
    }

    async fn fetch_average_mileage(
        &self,
        user_id: &UserId,
        vehicle_id: &VehicleId,
    ) -> Result<String, GatewayError> {
        self.record(Call::FetchAverage { user: user_id.to_string(), vehicle: vehicle_id.to_string() });
        let entry = self.script().averages.get(user_id.as_str()).cloned();
        let (delay, value) = entry.ok_or_else(|| unavailable(404))?;
        sleep(delay).await;
        Ok(value)
    }

    async fn publish_mileage(&self, reading: &MileageReading) -> Result<PublishAck, GatewayError> {
        self.record(Call::Publish(reading.clone()));
        let reply = {
            let mut script = self.script();
            let fallback = PublishReply {
                delay: Duration::ZERO,
                result: Ok(script.default_publish.clone()),
            };
            script.publish_replies.pop_front().unwrap_or(fallback)
        };
        sleep(reply.delay).await;
        match reply.result {
            Ok(message) => Ok(PublishAck { message }),
            Err(status) => Err(unavailable(status)),
        }
    }

    async fn poll_notification(
        &self,
        vehicle_id: &VehicleId,
        user_id: &UserId,
    ) -> Result<NotificationPayload, GatewayError> {
        self.record(Call::Poll { vehicle: vehicle_id.to_string(), user: user_id.to_string() });
        let failing = {
            let mut seen = self.polls_seen.lock().unwrap();
            *seen += 1;
            *seen <= self.script().failing_polls
        };
        let delay = self.script().poll_delay;
        sleep(delay).await;
        if failing {
            return Err(unavailable(503));
        }
        Ok(NotificationPayload { notification_message: self.script().notification.clone() })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<NotificationMessage>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<NotificationMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.text).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn push(&self, message: NotificationMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

pub struct Harness {
    pub engine: SyncEngine,
    pub gateway: Arc<FakeGateway>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(script: Script) -> Self {
        let gateway = FakeGateway::new(script);
        let sink = Arc::new(RecordingSink::default());
        let engine = SyncEngine::with_options(gateway.clone(), sink.clone(), EngineOptions::default());
        Self { engine, gateway, sink }
    }

    /// Selects `vehicle` then `user` and waits for every dependent fetch.
    pub async fn select_pair(&self, vehicle: &str, user: &str) {
        self.engine.select_vehicle(vehicle.into()).await;
        self.engine.select_user(user.into()).unwrap().await;
    }
}

/// `later - earlier`, for asserting request offsets.
pub fn offset(earlier: Instant, later: Instant) -> Duration {
    later.saturating_duration_since(earlier)
}
