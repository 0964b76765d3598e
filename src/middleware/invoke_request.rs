use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::types::invoke::InvokeRequest;

/// Parses and validates the invoke body; rejects empty prompts with 400
/// and maps body-limit rejections to the gateway's error shape.
pub struct InvokePreprocess(pub InvokeRequest);

impl<S> FromRequest<S> for InvokePreprocess
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = match Json::<InvokeRequest>::from_request(req, &()).await {
            Ok(v) => v,
            Err(rejection) => return Err(rejection_response(rejection.status())),
        };

        if body.prompt.trim().is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": { "code": "INVALID_REQUEST", "message": "prompt must not be empty" }
                })),
            )
                .into_response());
        }

        Ok(InvokePreprocess(body))
    }
}

fn rejection_response(status: StatusCode) -> Response {
    let (code, message) = match status {
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "request body too large"),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            ("UNSUPPORTED_MEDIA_TYPE", "expected application/json")
        }
        _ => ("INVALID_REQUEST", "request body is not valid JSON"),
    };
    (
        status,
        Json(json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}
