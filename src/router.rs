use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;

use crate::api::InferenceClient;
use crate::handlers::{invoke, strategy};
use crate::service::StrategyHandle;

/// Request bodies above this are rejected with 413.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct GateState {
    pub strategy: StrategyHandle,
    pub inference: InferenceClient,
    pub gate_key: Arc<str>,
}

impl GateState {
    pub fn new(strategy: StrategyHandle, inference: InferenceClient, gate_key: Arc<str>) -> Self {
        Self {
            strategy,
            inference,
            gate_key,
        }
    }
}

pub fn gate_router(state: GateState) -> Router {
    Router::new()
        .route("/health", get(strategy::health_handler))
        .route("/v1/models", get(strategy::models_handler))
        .route(
            "/v1/strategy",
            get(strategy::get_strategy_handler).post(strategy::publish_strategy_handler),
        )
        .route("/v1/strategy/reload", post(strategy::reload_strategy_handler))
        .route("/v1/invoke", post(invoke::invoke_handler))
        .route("/v1/invoke/stream", post(invoke::invoke_stream_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
