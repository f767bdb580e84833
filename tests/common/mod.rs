#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    Router,
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use dispatch_api::{
    app_router, auth,
    config::AppConfig,
    db,
    entities::{delivery_agent, product, user, vehicle},
    events,
    ml::PredictorStore,
    services::{
        dashboard::DashboardService,
        routing::RoutePlanner,
        shipments::{SelectionPolicy, ShipmentService},
        weather::WeatherClient,
    },
    AppServices, AppState,
};

/// Deterministic policy: always the first candidate in the pool.
struct FirstCandidate;

impl SelectionPolicy for FirstCandidate {
    fn choose_index(&self, _len: usize) -> usize {
        0
    }
}

/// Application harness backed by a throwaway sqlite file, mock routing and
/// weather upstreams, and a deterministic selection policy.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub routing_server: MockServer,
    pub weather_server: MockServer,
    _event_task: tokio::task::JoinHandle<()>,
    _work_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let work_dir = tempfile::tempdir().expect("create test workspace");
        let db_path = work_dir.path().join("dispatch_test.db");

        let routing_server = MockServer::start().await;
        let weather_server = MockServer::start().await;

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.routing_base_url = routing_server.uri();
        cfg.routing_api_key = "test-routing-key".to_string();
        cfg.weather_base_url = weather_server.uri();
        cfg.weather_api_key = Some("test-weather-key".to_string());
        cfg.model_dir = work_dir.path().join("models").display().to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let predictors = Arc::new(PredictorStore::new(cfg.model_dir.clone()));
        predictors
            .train_if_missing()
            .expect("train models for tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let route_planner = Arc::new(
            RoutePlanner::new(
                cfg.routing_base_url.clone(),
                cfg.routing_api_key.clone(),
                Duration::from_secs(2),
            )
            .expect("routing client"),
        );
        let weather = Arc::new(WeatherClient::new(
            cfg.weather_base_url.clone(),
            cfg.weather_api_key.clone(),
            Duration::from_secs(2),
        ));

        let shipments = Arc::new(ShipmentService::new(
            db_arc.clone(),
            event_sender.clone(),
            route_planner,
            weather,
            predictors.clone(),
            Arc::new(FirstCandidate),
        ));
        let dashboard = Arc::new(DashboardService::new(db_arc.clone(), predictors));

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services: AppServices {
                shipments,
                dashboard,
            },
        };

        let router = app_router(state.clone());

        Self {
            router,
            state,
            routing_server,
            weather_server,
            _event_task: event_task,
            _work_dir: work_dir,
        }
    }

    /// Mounts a successful directions response for any route lookup.
    pub async fn mock_route_ok(&self, distance_km: f64) {
        let meters = distance_km * 1000.0;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "routes": [{
                    "overview_polyline": {"points": "mock_polyline"},
                    "legs": [{
                        "distance": {"text": format!("{} km", distance_km), "value": meters},
                        "duration": {"text": "1 hour"},
                        "start_location": {"lat": 12.97, "lng": 77.59},
                        "end_location": {"lat": 13.08, "lng": 80.27}
                    }]
                }]
            })))
            .mount(&self.routing_server)
            .await;
    }

    /// Mounts a failed directions response (non-OK upstream status).
    pub async fn mock_route_failure(&self, status: &str, message: &str) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": status,
                "error_message": message
            })))
            .mount(&self.routing_server)
            .await;
    }

    /// Mounts a successful weather response.
    pub async fn mock_weather_ok(&self, temp: f64, description: &str) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "main": {"temp": temp},
                "weather": [{"description": description}]
            })))
            .mount(&self.weather_server)
            .await;
    }

    /// Creates a client row and a matching bearer token.
    pub async fn seed_client(&self, email: &str) -> (Uuid, String) {
        let model = user::ActiveModel {
            email: Set(email.to_string()),
            name: Set("Test Client".to_string()),
            avatar: Set(None),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed client");

        let token = auth::issue_token(
            model.id,
            Some(email.to_string()),
            &self.state.config.jwt_secret,
            chrono::Duration::hours(1),
        )
        .expect("issue test token");
        (model.id, token)
    }

    pub async fn seed_product(&self, name: &str, stock: i32, threshold: i32) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            sku: Set(format!("SKU-{}", Uuid::new_v4())),
            stock: Set(stock),
            description: Set(None),
            low_stock_threshold: Set(threshold),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn seed_vehicle(&self, name: &str, available: bool) -> vehicle::Model {
        vehicle::ActiveModel {
            name: Set(name.to_string()),
            license_plate: Set(format!("PLT-{}", &Uuid::new_v4().to_string()[..8])),
            is_available: Set(available),
            purchase_date: Set(Some(
                NaiveDate::from_ymd_opt(2022, 6, 1).expect("valid date"),
            )),
            total_km_driven: Set(12_000.0),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed vehicle")
    }

    pub async fn seed_agent(&self, available: bool) -> delivery_agent::Model {
        let account = user::ActiveModel {
            email: Set(format!("agent-{}@example.com", Uuid::new_v4())),
            name: Set("Test Agent".to_string()),
            avatar: Set(None),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed agent account");

        delivery_agent::ActiveModel {
            user_id: Set(account.id),
            phone_number: Set("5550100".to_string()),
            is_available: Set(available),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed agent")
    }

    /// Sends a request with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Reads the response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body as json")
}
