use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::{error, warn};

use super::admin::AdminState;
use super::error::ApiError;
use super::public::PublicState;
use super::rate_limit::Decision;

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        if status.is_server_error() {
            error!(
                target: "piatto::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms,
                "request failed",
            );
        } else {
            warn!(
                target: "piatto::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms,
                "client request error",
            );
        }
    }

    response
}

/// Bearer-token guard for the admin surface. Comparison is constant-time.
pub async fn admin_auth(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided =
        match extract_token(request.headers().get(axum::http::header::AUTHORIZATION)) {
            Some(value) => value,
            None => return ApiError::unauthorized().into_response(),
        };

    if !bool::from(provided.as_bytes().ct_eq(state.admin_token.as_bytes())) {
        return ApiError::unauthorized().into_response();
    }

    next.run(request).await
}

pub async fn public_rate_limit(
    State(state): State<PublicState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let caller = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match state.rate_limiter.allow(&caller) {
        Decision::Allowed { .. } => next.run(request).await,
        Decision::Denied { retry_after } => {
            ApiError::rate_limited(retry_after.as_secs().max(1))
        }
    }
}

fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.to_string())
}
