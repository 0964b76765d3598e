use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::router::GateState;

/// Ensure the inbound request is authorized.
/// Accepts either:
/// - Header: `x-api-key: ...`
/// - Header: `Authorization: Bearer <key>`
/// - Query string: `?key=...`
///   An empty configured key rejects everything.
pub fn ensure_authorized(
    expected: &str,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Result<(), Response> {
    if !expected.is_empty() {
        // 1) header: x-api-key
        if let Some(hv) = headers.get("x-api-key").and_then(|v| v.to_str().ok())
            && key_matches(hv, expected)
        {
            return Ok(());
        }

        // 2) header: Authorization: Bearer <key>
        if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
            let auth = auth.trim();
            if let Some(token) = auth
                .strip_prefix("Bearer ")
                .or_else(|| auth.strip_prefix("bearer "))
                && key_matches(token, expected)
            {
                return Ok(());
            }
        }

        // 3) query: key=...
        if let Some(qs) = query {
            for (k, v) in url::form_urlencoded::parse(qs.as_bytes()) {
                if k == "key" && key_matches(&v, expected) {
                    return Ok(());
                }
            }
        }
    }

    Err((
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "unauthorized", "reason": "invalid or missing key"})),
    )
        .into_response())
}

fn key_matches(candidate: &str, expected: &str) -> bool {
    bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}

#[derive(Debug, Clone, Copy)]
pub struct RequireKeyAuth;

impl FromRequestParts<GateState> for RequireKeyAuth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GateState,
    ) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        let query = parts.uri.query();
        ensure_authorized(&state.gate_key, headers, query)?;
        Ok(Self)
    }
}
