mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use sea_orm::EntityTrait;
use serde_json::json;
use uuid::Uuid;

use dispatch_api::entities::{delivery_agent, product, shipment, vehicle};

async fn create_shipment(
    app: &TestApp,
    token: &str,
    product_id: Uuid,
    quantity: i32,
) -> axum::response::Response {
    app.request(
        Method::POST,
        "/api/v1/shipments",
        Some(json!({
            "product_id": product_id,
            "quantity": quantity,
            "start_address": "1 Warehouse Way, Bengaluru, KA",
            "end_address": "123 Main St, Springfield, IL"
        })),
        Some(token),
    )
    .await
}

#[tokio::test]
async fn creating_a_shipment_assigns_resources_and_enriches_route() {
    let app = TestApp::new().await;
    app.mock_route_ok(42.0).await;
    app.mock_weather_ok(21.5, "light rain").await;

    let (_client_id, token) = app.seed_client("client@example.com").await;
    let product = app.seed_product("Cardboard Boxes", 10, 3).await;
    let agent = app.seed_agent(true).await;
    let vehicle = app.seed_vehicle("Van 1", true).await;

    let response = create_shipment(&app, &token, product.id, 4).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let data = &body["data"];
    assert_eq!(data["status"], "In Transit");
    assert_eq!(data["quantity"], 4);
    assert!((data["distance_km"].as_f64().unwrap() - 42.0).abs() < 1e-9);
    assert_eq!(data["route_polyline"], "mock_polyline");
    assert_eq!(data["weather_forecast"], "21.5°C, Light Rain");
    assert!(data["predicted_duration"]
        .as_str()
        .unwrap()
        .ends_with("hours"));
    assert_eq!(data["agent_id"], agent.id.to_string());
    assert_eq!(data["vehicle_id"], vehicle.id.to_string());

    // Both resources are claimed.
    let agent = delivery_agent::Entity::find_by_id(agent.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(!agent.is_available);
    let vehicle = vehicle::Entity::find_by_id(vehicle.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(!vehicle.is_available);

    // Stock is untouched until delivery.
    let product = product::Entity::find_by_id(product.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, 10);
}

#[tokio::test]
async fn insufficient_stock_rejects_creation() {
    let app = TestApp::new().await;
    app.mock_route_ok(42.0).await;

    let (_client_id, token) = app.seed_client("client@example.com").await;
    let product = app.seed_product("Cardboard Boxes", 2, 3).await;
    app.seed_agent(true).await;
    app.seed_vehicle("Van 1", true).await;

    let response = create_shipment(&app, &token, product.id, 5).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Out of stock"));
    assert!(message.contains("2 units available"));
    assert!(message.contains("Cardboard Boxes"));

    let count = shipment::Entity::find().all(&*app.state.db).await.unwrap();
    assert!(count.is_empty());
}

#[tokio::test]
async fn missing_agents_or_vehicles_reject_creation_without_side_effects() {
    let app = TestApp::new().await;
    app.mock_route_ok(42.0).await;

    let (_client_id, token) = app.seed_client("client@example.com").await;
    let product = app.seed_product("Cardboard Boxes", 10, 3).await;
    // A vehicle exists but no agent does.
    let vehicle = app.seed_vehicle("Van 1", true).await;

    let response = create_shipment(&app, &token, product.id, 1).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("No available delivery agents or vehicles at the moment."));

    assert!(shipment::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .is_empty());
    let vehicle = vehicle::Entity::find_by_id(vehicle.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(vehicle.is_available);
}

#[tokio::test]
async fn routing_failure_aborts_creation_and_releases_nothing() {
    let app = TestApp::new().await;
    app.mock_route_failure("NOT_FOUND", "Origin could not be geocoded.")
        .await;

    let (_client_id, token) = app.seed_client("client@example.com").await;
    let product = app.seed_product("Cardboard Boxes", 10, 3).await;
    let agent = app.seed_agent(true).await;
    let vehicle = app.seed_vehicle("Van 1", true).await;

    let response = create_shipment(&app, &token, product.id, 1).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("NOT_FOUND"));
    assert!(message.contains("Origin could not be geocoded."));

    assert!(shipment::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .is_empty());
    let agent = delivery_agent::Entity::find_by_id(agent.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(agent.is_available);
    let vehicle = vehicle::Entity::find_by_id(vehicle.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(vehicle.is_available);
}

#[tokio::test]
async fn delivery_is_idempotent_and_releases_resources_once() {
    let app = TestApp::new().await;
    app.mock_route_ok(42.0).await;
    app.mock_weather_ok(18.0, "clear sky").await;

    let (_client_id, token) = app.seed_client("client@example.com").await;
    let product = app.seed_product("Cardboard Boxes", 10, 3).await;
    let agent = app.seed_agent(true).await;
    let vehicle = app.seed_vehicle("Van 1", true).await;
    let initial_mileage = vehicle.total_km_driven;

    let response = create_shipment(&app, &token, product.id, 4).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let shipment_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let deliver_uri = format!("/api/v1/shipments/{}/deliver", shipment_id);
    let response = app
        .request(Method::POST, &deliver_uri, None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Shipment marked as delivered");

    let product_after = product::Entity::find_by_id(product.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product_after.stock, 6);
    let agent_after = delivery_agent::Entity::find_by_id(agent.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(agent_after.is_available);
    let vehicle_after = vehicle::Entity::find_by_id(vehicle.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(vehicle_after.is_available);
    assert!((vehicle_after.total_km_driven - (initial_mileage + 42.0)).abs() < 1e-9);

    // Second call reports success and changes nothing.
    let response = app
        .request(Method::POST, &deliver_uri, None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Shipment was already delivered");

    let product_again = product::Entity::find_by_id(product.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product_again.stock, 6);
    let vehicle_again = vehicle::Entity::find_by_id(vehicle.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!((vehicle_again.total_km_driven - vehicle_after.total_km_driven).abs() < 1e-9);
}

#[tokio::test]
async fn status_updates_accept_any_declared_value_and_reject_unknown_ones() {
    let app = TestApp::new().await;
    app.mock_route_ok(30.0).await;

    let (_client_id, token) = app.seed_client("client@example.com").await;
    let product = app.seed_product("Cardboard Boxes", 10, 3).await;
    app.seed_agent(true).await;
    app.seed_vehicle("Van 1", true).await;

    let response = create_shipment(&app, &token, product.id, 1).await;
    let shipment_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let status_uri = format!("/api/v1/shipments/{}/status", shipment_id);

    let response = app
        .request(
            Method::POST,
            &status_uri,
            Some(json!({"status": "Out for Delivery"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "Out for Delivery");

    // Backward transitions are permitted.
    let response = app
        .request(
            Method::POST,
            &status_uri,
            Some(json!({"status": "Pending"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "Pending");

    let response = app
        .request(
            Method::POST,
            &status_uri,
            Some(json!({"status": "Lost"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["message"]
        .as_str()
        .unwrap()
        .contains("Invalid status provided"));
}

#[tokio::test]
async fn location_updates_persist_and_validate_coordinates() {
    let app = TestApp::new().await;
    app.mock_route_ok(30.0).await;

    let (_client_id, token) = app.seed_client("client@example.com").await;
    let product = app.seed_product("Cardboard Boxes", 10, 3).await;
    app.seed_agent(true).await;
    app.seed_vehicle("Van 1", true).await;

    let response = create_shipment(&app, &token, product.id, 1).await;
    let shipment_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let location_uri = format!("/api/v1/shipments/{}/location", shipment_id);

    let response = app
        .request(
            Method::POST,
            &location_uri,
            Some(json!({"lat": 12.99, "lng": 77.61})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!((body["data"]["current_lat"].as_f64().unwrap() - 12.99).abs() < 1e-9);
    assert!((body["data"]["current_lng"].as_f64().unwrap() - 77.61).abs() < 1e-9);

    let response = app
        .request(
            Method::POST,
            &location_uri,
            Some(json!({"lat": 120.0, "lng": 77.61})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn shipments_are_scoped_to_their_owner() {
    let app = TestApp::new().await;
    app.mock_route_ok(30.0).await;

    let (_owner_id, owner_token) = app.seed_client("owner@example.com").await;
    let (_other_id, other_token) = app.seed_client("other@example.com").await;
    let product = app.seed_product("Cardboard Boxes", 10, 3).await;
    app.seed_agent(true).await;
    app.seed_vehicle("Van 1", true).await;

    let response = create_shipment(&app, &owner_token, product.id, 1).await;
    let shipment_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!("/api/v1/shipments/{}", shipment_id);
    let response = app.request(Method::GET, &uri, None, Some(&other_token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.request(Method::GET, &uri, None, Some(&owner_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The other client's listing is empty.
    let response = app
        .request(Method::GET, "/api/v1/shipments", None, Some(&other_token))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn shipment_endpoints_require_authentication() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/shipments", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/shipments", None, Some("not-a-token"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn directions_lookup_persists_nothing() {
    let app = TestApp::new().await;
    app.mock_route_ok(42.0).await;

    let (_client_id, token) = app.seed_client("client@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/directions",
            Some(json!({"origin": "A", "destination": "B"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["distance"], "42 km");
    assert_eq!(body["data"]["duration"], "1 hour");

    assert!(shipment::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn public_catalog_routes_need_no_token() {
    let app = TestApp::new().await;
    let product = app.seed_product("Cardboard Boxes", 10, 3).await;
    app.seed_vehicle("Van 1", true).await;

    let response = app
        .request(Method::GET, "/api/v1/products", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/products/{}", product.id);
    let response = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/vehicles", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["vehicles"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["active_shipments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn vehicle_listing_includes_active_shipments() {
    let app = TestApp::new().await;
    app.mock_route_ok(30.0).await;

    let (_client_id, token) = app.seed_client("client@example.com").await;
    let product = app.seed_product("Cardboard Boxes", 10, 3).await;
    app.seed_agent(true).await;
    app.seed_vehicle("Van 1", true).await;

    let response = create_shipment(&app, &token, product.id, 1).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::GET, "/api/v1/vehicles", None, None)
        .await;
    let body = body_json(response).await;
    let active = body["data"]["active_shipments"].as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["status"], "In Transit");
}
