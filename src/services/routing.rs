use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, instrument};

/// Latitude/longitude pair as returned by the directions service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// First route/leg summary of a directions lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub distance_text: String,
    pub duration_text: String,
    pub polyline: String,
    pub start: LatLng,
    pub end: LatLng,
}

/// Client for the external directions service. One attempt per lookup, no
/// retries: a failed route is terminal for the request that needed it.
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
    overview_polyline: Polyline,
}

#[derive(Debug, Deserialize)]
struct Polyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    duration: TextOnly,
    start_location: LatLng,
    end_location: LatLng,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    /// Meters
    value: f64,
}

#[derive(Debug, Deserialize)]
struct TextOnly {
    text: String,
}

impl RoutePlanner {
    pub fn new(
        base_url: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Resolves a route between two free-text addresses.
    ///
    /// Upstream failures surface as validation errors carrying the service's
    /// status and message, so callers can report them to the user directly.
    #[instrument(skip(self))]
    pub async fn get_route(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<RouteSummary, ServiceError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Directions request failed: {}", e);
                ServiceError::ValidationError(format!("Routing error: {}", e))
            })?;

        let body: DirectionsResponse = response.json().await.map_err(|e| {
            error!("Directions response unreadable: {}", e);
            ServiceError::ValidationError(format!("Routing error: {}", e))
        })?;

        if body.status != "OK" {
            let message = body
                .error_message
                .unwrap_or_else(|| "Could not calculate route.".to_string());
            return Err(ServiceError::ValidationError(format!(
                "Routing error: {}. {}",
                body.status, message
            )));
        }

        let route = body.routes.into_iter().next().ok_or_else(|| {
            ServiceError::ValidationError("Routing error: no route returned".to_string())
        })?;
        let polyline = route.overview_polyline.points;
        let leg = route.legs.into_iter().next().ok_or_else(|| {
            ServiceError::ValidationError("Routing error: route has no legs".to_string())
        })?;

        Ok(RouteSummary {
            distance_km: leg.distance.value / 1000.0,
            distance_text: leg.distance.text,
            duration_text: leg.duration.text,
            polyline,
            start: leg.start_location,
            end: leg.end_location,
        })
    }
}
