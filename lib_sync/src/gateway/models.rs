//! # Wire Models
//!
//! JSON shapes exchanged with the telemetry backend. Field names follow the
//! backend's camelCase contract; the Rust side uses snake_case.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status marker sent with every efficiency target update.
pub const EFFICIENCY_STATUS_ACTIVE: &str = "ACTIVE";

/// Ids arrive as strings from some deployments and as numbers from others.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl From<WireId> for String {
    fn from(raw: WireId) -> Self {
        match raw {
            WireId::Text(text) => text,
            WireId::Number(number) => number.to_string(),
        }
    }
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "WireId", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw id.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw id text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<WireId> for $name {
            fn from(raw: WireId) -> Self {
                Self(raw.into())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// Opaque vehicle identifier.
    VehicleId
);

opaque_id!(
    /// Opaque user identifier.
    UserId
);

/// A selectable vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Backend id.
    pub id: VehicleId,
    /// Human readable label.
    #[serde(rename = "name", alias = "displayName", default)]
    pub display_name: String,
}

/// A user bound to the currently selected vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Backend id.
    pub id: UserId,
    /// Human readable label.
    #[serde(rename = "name", alias = "displayName", default)]
    pub display_name: String,
}

/// Body of the efficiency target endpoints (`GET` response, `PUT` echo).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyTargetPayload {
    /// The target value as stored by the server.
    #[serde(rename = "efficientTargetValue")]
    pub value: f64,
}

/// Full tuple sent to update an efficiency target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyTargetUpdate {
    /// Requested target value; the server may clamp it.
    pub efficient_target_value: f64,
    /// Always [`EFFICIENCY_STATUS_ACTIVE`].
    pub status: String,
    /// Owner user.
    pub user_id: UserId,
    /// Owner vehicle.
    pub vehicle_id: VehicleId,
}

impl EfficiencyTargetUpdate {
    /// An active target update for `(user_id, vehicle_id)`.
    pub fn active(value: f64, user_id: UserId, vehicle_id: VehicleId) -> Self {
        Self {
            efficient_target_value: value,
            status: EFFICIENCY_STATUS_ACTIVE.to_string(),
            user_id,
            vehicle_id,
        }
    }
}

/// One mileage reading, the body of `POST /api/v1/mileage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MileageReading {
    /// Vehicle the reading belongs to.
    pub vehicle_id: VehicleId,
    /// User who reported it.
    pub user_id: UserId,
    /// The mileage value; units are implied by the backend.
    #[serde(rename = "currentMileage")]
    pub value: f64,
}

/// Response of the publish endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PublishAck {
    /// Optional human readable message to surface as a toast.
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of the notification endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NotificationPayload {
    /// Message text; absent or blank means "nothing to show".
    #[serde(rename = "notificationMessage", default)]
    pub notification_message: Option<String>,
}

impl NotificationPayload {
    /// The message text if it is worth displaying.
    pub fn into_text(self) -> Option<String> {
        non_blank(self.notification_message)
    }
}

impl PublishAck {
    /// The message text if it is worth displaying.
    pub fn into_text(self) -> Option<String> {
        non_blank(self.message)
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}
