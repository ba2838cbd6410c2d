//! EduERP attendance backend server

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    response::Response,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, Span};

use eduerp_attendance::{
    api::{create_router, AppState},
    config::Config,
    database::JsonFileStore,
    logging, request_span,
    services::{AttendanceService, CatalogService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    logging::init_logging(&config.log_level, config.log_format());
    logging::log_startup();
    config.log_config();

    config.ensure_data_dir()?;
    let store = JsonFileStore::open(config.store_path())
        .with_context(|| format!("failed to open store at {}", config.store_path().display()))?;

    let attendance = AttendanceService::new(config.simulator_config());
    let catalog = CatalogService::new(Arc::new(store));
    let state = AppState::new(attendance.clone(), catalog);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &Request<Body>| {
                        request_span!(request.method(), request.uri().path())
                    })
                    .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
                        logging::log_response(response.status(), latency, span)
                    }),
            )
            .layer(cors_layer(&config)),
    );

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("EduERP attendance server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    attendance.shutdown().await;
    info!("Server stopped");

    Ok(())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins = if config.cors_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(origins)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logging::log_error(&e.to_string(), "installing shutdown handler");
    }
    info!("Shutdown signal received");
}
