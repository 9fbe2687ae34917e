//! HTTP surfaces: a public read-only API and a token-guarded admin API,
//! served on separate listeners.

pub mod admin;
pub mod error;
pub mod middleware;
pub mod public;
pub mod rate_limit;
pub mod respond;

pub use admin::{AdminState, build_admin_router};
pub use public::{PublicState, build_public_router};
pub use rate_limit::RateLimiter;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;
use tracing::warn;

pub(crate) fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            warn!(target: "piatto::http", error = %err, "health check failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
