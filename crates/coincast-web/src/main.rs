//! coincast-web entry point.
//!
//! Loads configuration, installs tracing, builds the price source and serves
//! the router. Handlers live in `routes.rs`.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use coincast_core::{build_source, PredictionService, ReqwestHttpClient};
use coincast_web::{error::ServerError, routes, settings::ServerSettings, state::AppState};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local .env is a dev convenience; deployments inject variables directly.
    let _ = dotenvy::dotenv();

    init_tracing();

    let settings = ServerSettings::from_env().context("invalid configuration")?;
    let source = build_source(&settings.app, Arc::new(ReqwestHttpClient::new()))
        .map_err(ServerError::from)
        .context("failed to build price source")?;
    let policy = source.policy().clone();
    let service = PredictionService::new(source, settings.app.min_samples);
    let state = Arc::new(AppState::new(service, settings.static_dir.clone()));

    let app = routes::build_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let listener = tokio::net::TcpListener::bind(settings.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: settings.addr,
            source,
        })?;

    info!(
        provider = %policy.provider_id,
        horizon_ceiling_days = policy.horizon_ceiling_days,
        timeout_ms = policy.timeout_ms(),
        credential = settings.app.api_key.is_some(),
        "coincast-web listening on http://{}",
        settings.addr
    );

    axum::serve(listener, app).await.context("server crashed")?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:8000",
        "http://127.0.0.1:8000",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
    ]
    .iter()
    .filter_map(|origin| HeaderValue::from_str(origin).ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
