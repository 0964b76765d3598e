use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::{Value, json};
use tracing::info;

use crate::config::CONFIG;
use crate::strategy::SelectionStrategy;
use crate::{GateError, middleware::auth::RequireKeyAuth, router::GateState};

/// GET /v1/strategy — the active strategy document.
pub async fn get_strategy_handler(
    State(state): State<GateState>,
    _auth: RequireKeyAuth,
) -> Result<Json<SelectionStrategy>, GateError> {
    let strategy = state.strategy.get().await?.ok_or(GateError::NoStrategy)?;
    Ok(Json(strategy.as_ref().clone()))
}

/// POST /v1/strategy — publish a strategy document (operator upload).
pub async fn publish_strategy_handler(
    State(state): State<GateState>,
    _auth: RequireKeyAuth,
    Json(strategy): Json<SelectionStrategy>,
) -> Result<impl IntoResponse, GateError> {
    let id = state.strategy.publish(strategy).await?;
    info!(id, "strategy published via API");
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// POST /v1/strategy/reload — re-read the newest stored document.
pub async fn reload_strategy_handler(
    State(state): State<GateState>,
    _auth: RequireKeyAuth,
) -> Result<Json<SelectionStrategy>, GateError> {
    let strategy = state.strategy.reload().await?.ok_or(GateError::NoStrategy)?;
    Ok(Json(strategy.as_ref().clone()))
}

/// GET /v1/models — configured variants with pricing.
pub async fn models_handler(_auth: RequireKeyAuth) -> Json<Value> {
    let data: Vec<Value> = CONFIG
        .variants
        .iter()
        .map(|v| {
            json!({
                "id": v.id,
                "object": "model",
                "input_per_mtok": v.input_per_mtok,
                "output_per_mtok": v.output_per_mtok,
            })
        })
        .collect();
    Json(json!({ "object": "list", "data": data }))
}

/// GET /health — liveness probe; unauthenticated.
pub async fn health_handler() -> &'static str {
    "ok"
}
