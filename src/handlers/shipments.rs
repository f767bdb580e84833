use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedClient;
use crate::entities::{shipment, ShipmentStatus};
use crate::services::shipments::{DeliveryOutcome, NewShipment};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateShipmentRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 255, message = "Start address is required"))]
    pub start_address: String,
    #[validate(length(min = 1, max = 255, message = "End address is required"))]
    pub end_address: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DirectionsRequest {
    #[validate(length(min = 1, message = "Origin is required"))]
    pub origin: String,
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DirectionsSummary {
    pub distance: String,
    pub duration: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShipmentResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub agent_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub start_address: String,
    pub end_address: String,
    pub route_polyline: Option<String>,
    pub distance_km: Option<f64>,
    pub predicted_duration: Option<String>,
    pub weather_forecast: Option<String>,
    pub current_lat: Option<f64>,
    pub current_lng: Option<f64>,
}

impl From<shipment::Model> for ShipmentResponse {
    fn from(model: shipment::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            quantity: model.quantity,
            agent_id: model.agent_id,
            vehicle_id: model.vehicle_id,
            status: model.status.to_string(),
            created_at: model.created_at,
            delivered_at: model.delivered_at,
            start_address: model.start_address,
            end_address: model.end_address,
            route_polyline: model.route_polyline,
            distance_km: model.distance_km,
            predicted_duration: model.predicted_duration,
            weather_forecast: model.weather_forecast,
            current_lat: model.current_lat,
            current_lng: model.current_lng,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/shipments",
    summary = "Create shipment",
    request_body = CreateShipmentRequest,
    responses(
        (status = 201, description = "Shipment created", body = ApiResponse<ShipmentResponse>),
        (status = 400, description = "Precondition failed", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 409, description = "Assignment conflict", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "shipments"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    AuthenticatedClient(client_id): AuthenticatedClient,
    Json(payload): Json<CreateShipmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let shipment = state
        .shipment_service()
        .create_shipment(
            client_id,
            NewShipment {
                product_id: payload.product_id,
                quantity: payload.quantity,
                start_address: payload.start_address,
                end_address: payload.end_address,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ShipmentResponse::from(shipment))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments",
    summary = "List own shipments",
    responses(
        (status = 200, description = "Shipments retrieved", body = ApiResponse<Vec<ShipmentResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "shipments"
)]
pub async fn list_shipments(
    State(state): State<AppState>,
    AuthenticatedClient(client_id): AuthenticatedClient,
) -> ApiResult<Vec<ShipmentResponse>> {
    let shipments = state.shipment_service().list_shipments(client_id).await?;
    Ok(Json(ApiResponse::success(
        shipments.into_iter().map(ShipmentResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments/{id}",
    summary = "Get own shipment",
    params(("id" = Uuid, Path, description = "Shipment id")),
    responses(
        (status = 200, description = "Shipment retrieved", body = ApiResponse<ShipmentResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "shipments"
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    AuthenticatedClient(client_id): AuthenticatedClient,
    Path(id): Path<Uuid>,
) -> ApiResult<ShipmentResponse> {
    let shipment = state
        .shipment_service()
        .get_shipment(client_id, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Shipment {} not found", id)))?;
    Ok(Json(ApiResponse::success(shipment.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/shipments/{id}/deliver",
    summary = "Mark shipment delivered",
    params(("id" = Uuid, Path, description = "Shipment id")),
    responses(
        (status = 200, description = "Delivery recorded", body = ApiResponse<DeliveryResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "shipments"
)]
pub async fn mark_delivered(
    State(state): State<AppState>,
    AuthenticatedClient(client_id): AuthenticatedClient,
    Path(id): Path<Uuid>,
) -> ApiResult<DeliveryResponse> {
    let outcome = state.shipment_service().mark_delivered(client_id, id).await?;
    let message = match outcome {
        DeliveryOutcome::Delivered => "Shipment marked as delivered",
        DeliveryOutcome::AlreadyDelivered => "Shipment was already delivered",
    };
    Ok(Json(ApiResponse::success(DeliveryResponse {
        message: message.to_string(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/shipments/{id}/status",
    summary = "Update shipment status",
    params(("id" = Uuid, Path, description = "Shipment id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<ShipmentResponse>),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "shipments"
)]
pub async fn update_status(
    State(state): State<AppState>,
    AuthenticatedClient(client_id): AuthenticatedClient,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<ShipmentResponse> {
    let status: ShipmentStatus = payload
        .status
        .parse()
        .map_err(|_| ServiceError::ValidationError("Invalid status provided".to_string()))?;
    let shipment = state
        .shipment_service()
        .update_status(client_id, id, status)
        .await?;
    Ok(Json(ApiResponse::success(shipment.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/shipments/{id}/location",
    summary = "Update live location",
    params(("id" = Uuid, Path, description = "Shipment id")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = ApiResponse<ShipmentResponse>),
        (status = 400, description = "Invalid coordinates", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "shipments"
)]
pub async fn update_location(
    State(state): State<AppState>,
    AuthenticatedClient(client_id): AuthenticatedClient,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> ApiResult<ShipmentResponse> {
    let shipment = state
        .shipment_service()
        .update_location(client_id, id, payload.lat, payload.lng)
        .await?;
    Ok(Json(ApiResponse::success(shipment.into())))
}

/// Pure routing lookup. Nothing is persisted.
#[utoipa::path(
    post,
    path = "/api/v1/directions",
    summary = "Route lookup",
    request_body = DirectionsRequest,
    responses(
        (status = 200, description = "Route resolved", body = ApiResponse<DirectionsSummary>),
        (status = 400, description = "Route not resolvable", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "shipments"
)]
pub async fn get_directions(
    State(state): State<AppState>,
    AuthenticatedClient(_client_id): AuthenticatedClient,
    Json(payload): Json<DirectionsRequest>,
) -> ApiResult<DirectionsSummary> {
    payload.validate()?;
    let route = state
        .shipment_service()
        .get_directions(&payload.origin, &payload.destination)
        .await?;
    Ok(Json(ApiResponse::success(DirectionsSummary {
        distance: route.distance_text,
        duration: route.duration_text,
    })))
}
