use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Error as SqlxError;
use std::collections::HashMap;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum GateError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("No selection strategy has been published")]
    NoStrategy,

    #[error("Evaluation produced no usable samples")]
    EmptyEvaluation,

    #[error("Test suite contains no cases")]
    EmptySuite,

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Upstream API error ({0}): {1:?}")]
    UpstreamApi(StatusCode, UpstreamError),

    #[error("Actor error: {0}")]
    RactorError(String),
}

impl IntoResponse for GateError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            GateError::UpstreamApi(status, upstream_err) => {
                let body = ApiErrorBody {
                    code: "UPSTREAM_ERROR".to_string(),
                    message: upstream_err.error.message,
                };
                (status, body)
            }
            GateError::NoStrategy => {
                let status = StatusCode::SERVICE_UNAVAILABLE; // 503
                let body = ApiErrorBody {
                    code: "NO_STRATEGY".to_string(),
                    message: "No selection strategy has been published yet.".to_string(),
                };
                (status, body)
            }
            GateError::Database(_) | GateError::RactorError(_) | GateError::Io(_) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                };
                (status, body)
            }
            GateError::Reqwest(_)
            | GateError::UrlParse(_)
            | GateError::Json(_)
            | GateError::MalformedResponse(_) => {
                let status = StatusCode::BAD_GATEWAY;
                let body = ApiErrorBody {
                    code: "BAD_GATEWAY".to_string(),
                    message: "Upstream service is unavailable.".to_string(),
                };
                (status, body)
            }
            GateError::EmptyEvaluation | GateError::EmptySuite => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "Evaluation data is unavailable.".to_string(),
                };
                (status, body)
            }
            GateError::UpstreamStatus(code) => {
                let (err_code, msg) = match code {
                    StatusCode::TOO_MANY_REQUESTS => {
                        ("RATE_LIMIT", "Upstream rate limit exceeded.")
                    }
                    StatusCode::UNAUTHORIZED => ("UNAUTHORIZED", "Upstream authentication failed."),
                    StatusCode::FORBIDDEN => ("FORBIDDEN", "Upstream permission denied."),
                    StatusCode::NOT_FOUND => ("NOT_FOUND", "Upstream resource not found."),
                    _ => ("UPSTREAM_ERROR", "An upstream error occurred."),
                };

                (
                    code,
                    ApiErrorBody {
                        code: err_code.to_string(),
                        message: msg.to_string(),
                    },
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Error envelope returned by the OpenAI-compatible upstream.
#[derive(Deserialize, Debug)]
pub struct UpstreamError {
    pub error: UpstreamErrorBody,
}

#[derive(Deserialize, Debug)]
pub struct UpstreamErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub code: Option<Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enveloped_rate_limit_keeps_upstream_status() {
        let raw = r#"{"error":{"message":"Rate limit reached","type":"requests","code":"rate_limit_exceeded"}}"#;
        let envelope: UpstreamError = serde_json::from_str(raw).unwrap();
        let resp =
            GateError::UpstreamApi(StatusCode::TOO_MANY_REQUESTS, envelope).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn enveloped_auth_failure_keeps_upstream_status() {
        let raw = r#"{"error":{"message":"Invalid API key","type":"invalid_request_error","code":null}}"#;
        let envelope: UpstreamError = serde_json::from_str(raw).unwrap();
        let resp = GateError::UpstreamApi(StatusCode::UNAUTHORIZED, envelope).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bare_status_maps_to_named_error_code() {
        let resp = GateError::UpstreamStatus(StatusCode::TOO_MANY_REQUESTS).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
