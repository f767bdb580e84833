use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use dispatch_api::{
    app_router, config, db, events,
    ml::PredictorStore,
    services::{
        dashboard::DashboardService,
        routing::RoutePlanner,
        shipments::{ShipmentService, UniformRandomPolicy},
        weather::WeatherClient,
    },
    AppServices, AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config().context("Failed to load configuration")?;
    config::init_tracing(config.log_level(), config.log_json);

    info!(
        environment = %config.environment,
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let db_pool = Arc::new(
        db::establish_connection_from_app_config(&config)
            .await
            .context("Failed to connect to the database")?,
    );

    if config.auto_migrate {
        db::run_migrations(&db_pool)
            .await
            .context("Failed to run database migrations")?;
    }

    // Train regression models before accepting traffic. Idempotent: existing
    // artifacts are left untouched.
    let predictors = Arc::new(PredictorStore::new(config.model_dir.clone()));
    predictors
        .train_if_missing()
        .context("Failed to prepare prediction models")?;

    let (event_sender, event_receiver) = events::channel(1024);
    tokio::spawn(events::process_events(event_receiver));

    let route_planner = Arc::new(
        RoutePlanner::new(
            config.routing_base_url.clone(),
            config.routing_api_key.clone(),
            Duration::from_secs(config.routing_timeout_secs),
        )
        .context("Failed to build the routing client")?,
    );
    let weather = Arc::new(WeatherClient::new(
        config.weather_base_url.clone(),
        config.weather_api_key.clone(),
        Duration::from_secs(config.weather_timeout_secs),
    ));

    let shipments = Arc::new(ShipmentService::new(
        db_pool.clone(),
        event_sender.clone(),
        route_planner,
        weather,
        predictors.clone(),
        Arc::new(UniformRandomPolicy),
    ));
    let dashboard = Arc::new(DashboardService::new(db_pool.clone(), predictors));

    let state = AppState {
        db: db_pool,
        config: config.clone(),
        event_sender,
        services: AppServices {
            shipments,
            dashboard,
        },
    };

    let cors = build_cors(&config);
    let app = app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

fn build_cors(config: &config::AppConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];
    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE];

    match config
        .cors_allowed_origins
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(parsed)
                .allow_methods(methods)
                .allow_headers(headers)
        }
        None => {
            if !config.is_development() {
                warn!("No CORS origins configured outside development; allowing any origin");
            }
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(methods)
                .allow_headers(headers)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
