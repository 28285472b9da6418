//! Bearer-token auth for the inbound control API (spec.md §6): `POST
//! /jobs/initial`, `POST /jobs/priority`, and `GET /status` require
//! `Authorization: Bearer <service_secret>`; `/health` and `/metrics` are
//! unauthenticated. No OAuth flow, no cookies, no external IDP — the only
//! caller is the sibling consumer service operating under one shared
//! secret.

use axum::extract::FromRequestParts;
use axum::http::{StatusCode, header, request::Parts};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use super::WebState;

/// Extractor that rejects the request with 401/403 unless the
/// `Authorization` header carries `Bearer <service_secret>`.
pub struct RequireBearerAuth;

impl FromRequestParts<WebState> for RequireBearerAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &WebState) -> Result<Self, Self::Rejection> {
        let Some(header_value) = parts.headers.get(header::AUTHORIZATION) else {
            return Err(unauthorized("missing Authorization header"));
        };
        let Ok(header_str) = header_value.to_str() else {
            return Err(unauthorized("malformed Authorization header"));
        };
        let Some(token) = header_str.strip_prefix("Bearer ") else {
            return Err(unauthorized("expected Bearer token"));
        };
        if token != state.service_secret {
            return Err(forbidden("invalid bearer token"));
        }
        Ok(RequireBearerAuth)
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}

fn forbidden(message: &str) -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
}
