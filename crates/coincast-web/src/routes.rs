//! Axum router and HTTP handlers.
//!
//! `build_router` is the single entry point. Middleware (CORS, tracing) is
//! attached in `main.rs` so tests can drive the bare router.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use coincast_core::{
    CoinStatsResult, ForecastError, MovingAverageResult, PredictionRequest, PredictionResult,
    PriceHistoryResult, TargetSpec,
};
use tower_http::services::ServeFile;

use crate::{
    api_types::{HealthResponse, PredictBody},
    error::ApiError,
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    let homepage = ServeFile::new(state.static_dir.join("index.html"));

    Router::new()
        .route_service("/", homepage)
        .route("/health", get(health))
        .route("/predict_linear", post(predict_linear))
        .route("/coin_stats/:symbol", get(coin_stats))
        .route("/historical_prices/:symbol/:days", get(historical_prices))
        .route("/moving_average/:symbol/:window", get(moving_average))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        service: st.build.service.to_owned(),
        version: st.build.version.to_owned(),
        provider: st.service.provider(),
    })
}

// ---------------------------------------------------------------------------
// POST /predict_linear
// ---------------------------------------------------------------------------

pub(crate) async fn predict_linear(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<PredictBody>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        ForecastError::invalid_request(format!("invalid request body: {}", rejection.body_text()))
    })?;

    let target = TargetSpec::from_parts(body.target_date.as_deref(), body.days_ahead)?;
    let request = PredictionRequest::new(body.symbol, target);
    let result = st.service.predict(st.today(), &request).await?;
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// GET /coin_stats/:symbol
// ---------------------------------------------------------------------------

pub(crate) async fn coin_stats(
    State(st): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<CoinStatsResult>, ApiError> {
    Ok(Json(st.service.coin_stats(&symbol).await?))
}

// ---------------------------------------------------------------------------
// GET /historical_prices/:symbol/:days
// ---------------------------------------------------------------------------

pub(crate) async fn historical_prices(
    State(st): State<Arc<AppState>>,
    Path((symbol, days)): Path<(String, String)>,
) -> Result<Json<PriceHistoryResult>, ApiError> {
    let days = days
        .parse::<u32>()
        .map_err(|_| ForecastError::invalid_request(format!("days must be a positive integer, got '{days}'")))?;
    Ok(Json(st.service.history(&symbol, days).await?))
}

// ---------------------------------------------------------------------------
// GET /moving_average/:symbol/:window
// ---------------------------------------------------------------------------

pub(crate) async fn moving_average(
    State(st): State<Arc<AppState>>,
    Path((symbol, window)): Path<(String, String)>,
) -> Result<Json<MovingAverageResult>, ApiError> {
    let window = window.parse::<usize>().map_err(|_| {
        ForecastError::invalid_request(format!("window must be a positive integer, got '{window}'"))
    })?;
    Ok(Json(st.service.moving_average(&symbol, window).await?))
}
