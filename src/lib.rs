pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod ml;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

pub use handlers::AppServices;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

impl AppState {
    pub fn config(&self) -> &config::AppConfig {
        &self.config
    }

    pub fn shipment_service(&self) -> Arc<services::shipments::ShipmentService> {
        self.services.shipments.clone()
    }

    pub fn dashboard_service(&self) -> Arc<services::dashboard::DashboardService> {
        self.services.dashboard.clone()
    }
}

/// Standard JSON envelope for successful and failed responses.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON handlers
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// All `/api/v1` routes. Catalog reads are public; shipment and dashboard
/// routes authenticate through the Bearer extractor inside each handler.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(handlers::products::list_products))
        .route("/products/:id", get(handlers::products::get_product))
        .route("/vehicles", get(handlers::vehicles::list_vehicles))
        .route(
            "/shipments",
            post(handlers::shipments::create_shipment).get(handlers::shipments::list_shipments),
        )
        .route("/shipments/:id", get(handlers::shipments::get_shipment))
        .route(
            "/shipments/:id/deliver",
            post(handlers::shipments::mark_delivered),
        )
        .route(
            "/shipments/:id/status",
            post(handlers::shipments::update_status),
        )
        .route(
            "/shipments/:id/location",
            post(handlers::shipments::update_location),
        )
        .route("/directions", post(handlers::shipments::get_directions))
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/status", get(api_status))
}

/// Full application router: versioned API, liveness probe, swagger UI.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(openapi::swagger_ui())
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}

async fn api_status() -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(health_data)))
}
