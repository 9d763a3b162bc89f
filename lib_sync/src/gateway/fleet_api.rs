//! # Fleet API Gateway
//!
//! `FleetGateway` is the seam between the synchronization core and the
//! network. The core only ever talks to `Arc<dyn FleetGateway>`; the
//! production implementation is [`HttpFleetGateway`], tests plug in
//! scripted fakes.

use async_trait::async_trait;
use reqwest::Method;

use super::models::{
    EfficiencyTargetPayload, EfficiencyTargetUpdate, MileageReading, NotificationPayload,
    PublishAck, User, UserId, Vehicle, VehicleId,
};
use crate::retrieve::{ApiClient, ApiClientOptions, GatewayError};

const API_ROOT: [&str; 2] = ["api", "v1"];

/// Typed access to every backend endpoint.
#[async_trait]
pub trait FleetGateway: Send + Sync + 'static {
    /// `GET /api/v1/vehicles`
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, GatewayError>;

    /// `GET /api/v1/users/vehicle/{vehicleId}`
    async fn list_users(&self, vehicle_id: &VehicleId) -> Result<Vec<User>, GatewayError>;

    /// `GET /api/v1/efficiency-targets/user/{userId}/vehicle/{vehicleId}`
    async fn fetch_efficiency_target(
        &self,
        user_id: &UserId,
        vehicle_id: &VehicleId,
    ) -> Result<f64, GatewayError>;

    /// `PUT /api/v1/efficiency-targets`, returning the value the server stored.
    async fn update_efficiency_target(
        &self,
        update: &EfficiencyTargetUpdate,
    ) -> Result<f64, GatewayError>;

    /// `GET /api/v1/mileage/averageMileage?userId=&vehicleId=` (plain text).
    async fn fetch_average_mileage(
        &self,
        user_id: &UserId,
        vehicle_id: &VehicleId,
    ) -> Result<String, GatewayError>;

    /// `POST /api/v1/mileage`
    async fn publish_mileage(&self, reading: &MileageReading) -> Result<PublishAck, GatewayError>;

    /// `GET /api/v1/notification?vehicleId=&userId=`
    async fn poll_notification(
        &self,
        vehicle_id: &VehicleId,
        user_id: &UserId,
    ) -> Result<NotificationPayload, GatewayError>;
}

/// [`FleetGateway`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFleetGateway {
    api: ApiClient,
}

impl HttpFleetGateway {
    /// Wraps an existing client.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Builds the client for `base_url` and wraps it.
    pub fn connect(base_url: &str, options: &ApiClientOptions) -> Result<Self, GatewayError> {
        Ok(Self::new(ApiClient::new(base_url, options)?))
    }

    fn url(&self, path: &[&str], query: &[(&str, &str)]) -> Result<url::Url, GatewayError> {
        let segments: Vec<&str> = API_ROOT.iter().chain(path.iter()).copied().collect();
        self.api.endpoint(&segments, query)
    }
}

#[async_trait]
impl FleetGateway for HttpFleetGateway {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, GatewayError> {
        let url = self.url(&["vehicles"], &[])?;
        self.api.get_json(url).await
    }

    async fn list_users(&self, vehicle_id: &VehicleId) -> Result<Vec<User>, GatewayError> {
        let url = self.url(&["users", "vehicle", vehicle_id.as_str()], &[])?;
        self.api.get_json(url).await
    }

    async fn fetch_efficiency_target(
        &self,
        user_id: &UserId,
        vehicle_id: &VehicleId,
    ) -> Result<f64, GatewayError> {
        let url = self.url(
            &[
                "efficiency-targets",
                "user",
                user_id.as_str(),
                "vehicle",
                vehicle_id.as_str(),
            ],
            &[],
        )?;
        let payload: EfficiencyTargetPayload = self.api.get_json(url).await?;
        Ok(payload.value)
    }

    async fn update_efficiency_target(
        &self,
        update: &EfficiencyTargetUpdate,
    ) -> Result<f64, GatewayError> {
        let url = self.url(&["efficiency-targets"], &[])?;
        let echoed: EfficiencyTargetPayload = self.api.send_json(Method::PUT, url, update).await?;
        Ok(echoed.value)
    }

    async fn fetch_average_mileage(
        &self,
        user_id: &UserId,
        vehicle_id: &VehicleId,
    ) -> Result<String, GatewayError> {
        let url = self.url(
            &["mileage", "averageMileage"],
            &[("userId", user_id.as_str()), ("vehicleId", vehicle_id.as_str())],
        )?;
        let text = self.api.get_text(url).await?;
        Ok(text.trim().to_string())
    }

    async fn publish_mileage(&self, reading: &MileageReading) -> Result<PublishAck, GatewayError> {
        let url = self.url(&["mileage"], &[])?;
        self.api.send_json(Method::POST, url, reading).await
    }

    async fn poll_notification(
        &self,
        vehicle_id: &VehicleId,
        user_id: &UserId,
    ) -> Result<NotificationPayload, GatewayError> {
        let url = self.url(
            &["notification"],
            &[("vehicleId", vehicle_id.as_str()), ("userId", user_id.as_str())],
        )?;
        self.api.get_json(url).await
    }
}
