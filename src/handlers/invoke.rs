use axum::{
    Json,
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use eventsource_stream::{Event, Eventsource};
use serde_json::json;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::config::CONFIG;
use crate::middleware::invoke_request::InvokePreprocess;
use crate::strategy::select_model;
use crate::types::chat::{ChatRequest, ChatStreamChunk};
use crate::types::invoke::InvokeResponse;
use crate::{GateError, middleware::auth::RequireKeyAuth, router::GateState};

/// POST /v1/invoke — route to the selected variant, return the full answer.
pub async fn invoke_handler(
    State(state): State<GateState>,
    _auth: RequireKeyAuth,
    InvokePreprocess(req): InvokePreprocess,
) -> Result<Json<InvokeResponse>, GateError> {
    let strategy = state.strategy.get().await?.ok_or(GateError::NoStrategy)?;
    let model = select_model(&strategy, &req.use_case).to_string();
    info!(model = %model, use_case = %req.use_case, "routing invoke");

    let chat_req = ChatRequest::single_turn(&CONFIG, model.clone(), req.prompt);
    let resp = state.inference.chat(&chat_req).await?;

    Ok(Json(InvokeResponse {
        model_used: model,
        response: resp.text().unwrap_or_default().to_string(),
    }))
}

/// POST /v1/invoke/stream — route to the selected variant and relay the
/// answer as it is generated: a `model_used` line first, then `chunk`
/// lines, then `[DONE]`.
pub async fn invoke_stream_handler(
    State(state): State<GateState>,
    _auth: RequireKeyAuth,
    InvokePreprocess(req): InvokePreprocess,
) -> Result<Response, GateError> {
    let strategy = state.strategy.get().await?.ok_or(GateError::NoStrategy)?;
    let model = select_model(&strategy, &req.use_case).to_string();
    info!(model = %model, use_case = %req.use_case, "routing streamed invoke");

    let chat_req = ChatRequest::streaming(&CONFIG, model.clone(), req.prompt);
    let upstream = state.inference.chat_stream(&chat_req).await?;

    Ok(build_stream_response(
        model,
        upstream.bytes_stream().eventsource(),
    ))
}

/// Frame an upstream SSE event stream as the client-facing body: one
/// `model_used` line, then `chunk` lines, then `[DONE]`.
fn build_stream_response<S, E>(model: String, events: S) -> Response
where
    S: Stream<Item = Result<Event, E>> + Send + 'static,
    E: Into<axum::BoxError> + Send + 'static,
{
    let head: Result<Bytes, E> = Ok(Bytes::from(format!(
        "{}\n\n",
        json!({ "model_used": model })
    )));

    let tail = events.filter_map(|event| {
        let event = match event {
            Ok(event) => event,
            Err(e) => return Some(Err(e)),
        };
        if event.data == "[DONE]" {
            return Some(Ok(Bytes::from("[DONE]\n\n")));
        }
        match serde_json::from_str::<ChatStreamChunk>(&event.data) {
            Ok(chunk) => chunk
                .delta_text()
                .filter(|text| !text.is_empty())
                .map(|text| Ok(Bytes::from(format!("{}\n\n", json!({ "chunk": text }))))),
            Err(e) => {
                warn!(error = %e, "unparseable upstream chunk; skipping");
                None
            }
        }
    });

    let body = Body::from_stream(tokio_stream::once(head).chain(tail));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}
