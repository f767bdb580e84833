use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::vehicle;
use crate::handlers::shipments::ShipmentResponse;
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub name: String,
    pub license_plate: String,
    pub is_available: bool,
    pub purchase_date: Option<NaiveDate>,
    pub total_km_driven: f64,
}

impl From<vehicle::Model> for VehicleResponse {
    fn from(model: vehicle::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            license_plate: model.license_plate,
            is_available: model.is_available,
            purchase_date: model.purchase_date,
            total_km_driven: model.total_km_driven,
        }
    }
}

/// Fleet listing enriched with the shipments currently on the road, so a
/// map view can be drawn from one request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VehicleCatalog {
    pub vehicles: Vec<VehicleResponse>,
    pub active_shipments: Vec<ShipmentResponse>,
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    summary = "List vehicles with active shipments",
    responses(
        (status = 200, description = "Fleet retrieved", body = ApiResponse<VehicleCatalog>),
    ),
    tag = "vehicles"
)]
pub async fn list_vehicles(State(state): State<AppState>) -> ApiResult<VehicleCatalog> {
    let vehicles = vehicle::Entity::find()
        .order_by_asc(vehicle::Column::Name)
        .all(&*state.db)
        .await
        .map_err(ServiceError::DatabaseError)?;

    let active = state.shipment_service().active_shipments().await?;

    Ok(Json(ApiResponse::success(VehicleCatalog {
        vehicles: vehicles.into_iter().map(VehicleResponse::from).collect(),
        active_shipments: active.into_iter().map(ShipmentResponse::from).collect(),
    })))
}
