use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::warn;

use tallybank_auth::{ApiKey, JwtValidator};
use tallybank_ledger::IdentifierKind;

use crate::app::errors;
use crate::context::CallerContext;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub api_key: ApiKey,
}

/// Require a valid bearer token and the shared API key; attach the caller.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers()).ok_or_else(|| unauthorized("Unauthenticated."))?;

    let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
        warn!(error = %e, "rejected bearer token");
        unauthorized("Unauthenticated.")
    })?;

    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !state.api_key.verify(presented) {
        warn!(user_id = %claims.sub, "rejected API key");
        return Err(unauthorized("Invalid API key."));
    }

    req.extensions_mut().insert(CallerContext::new(claims.sub));

    Ok(next.run(req).await)
}

/// Require `X-Account-Identifier-Type: id|number` and attach the parsed kind.
pub async fn identifier_kind_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let raw = req
        .headers()
        .get(IdentifierKind::HEADER)
        .and_then(|v| v.to_str().ok());

    match IdentifierKind::parse(raw) {
        Ok(kind) => {
            req.extensions_mut().insert(kind);
            next.run(req).await
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn unauthorized(message: &'static str) -> Response {
    errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
