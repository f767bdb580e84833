use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dispatch API",
        description = "Shipment management API: product catalog, fleet, shipment \
lifecycle with agent and vehicle assignment, route and weather enrichment, and \
dashboard analytics. Authenticated endpoints expect a Bearer JWT issued by the \
external identity provider."
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::vehicles::list_vehicles,
        crate::handlers::shipments::create_shipment,
        crate::handlers::shipments::list_shipments,
        crate::handlers::shipments::get_shipment,
        crate::handlers::shipments::mark_delivered,
        crate::handlers::shipments::update_status,
        crate::handlers::shipments::update_location,
        crate::handlers::shipments::get_directions,
        crate::handlers::dashboard::get_dashboard,
    ),
    components(
        schemas(
            crate::handlers::products::ProductResponse,
            crate::handlers::vehicles::VehicleResponse,
            crate::handlers::vehicles::VehicleCatalog,
            crate::handlers::shipments::CreateShipmentRequest,
            crate::handlers::shipments::UpdateStatusRequest,
            crate::handlers::shipments::UpdateLocationRequest,
            crate::handlers::shipments::DirectionsRequest,
            crate::handlers::shipments::DirectionsSummary,
            crate::handlers::shipments::DeliveryResponse,
            crate::handlers::shipments::ShipmentResponse,
            crate::services::dashboard::DashboardPayload,
            crate::services::dashboard::DashboardStats,
            crate::services::dashboard::DashboardCharts,
            crate::services::dashboard::MonthlyVolume,
            crate::services::dashboard::ProductVolume,
            crate::services::dashboard::DeliveryPerformance,
            crate::services::dashboard::DashboardPredictions,
            crate::errors::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "products", description = "Product catalog"),
        (name = "vehicles", description = "Fleet"),
        (name = "shipments", description = "Shipment lifecycle"),
        (name = "dashboard", description = "Analytics"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_declares_paths() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("/api/v1/shipments"));
        assert!(json.contains("/api/v1/dashboard"));
        assert!(json.contains("bearer_auth"));
    }
}
