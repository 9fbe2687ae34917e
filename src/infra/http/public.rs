//! Diner-facing read API.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    middleware as axum_middleware,
    response::Response,
    routing::get,
};

use crate::application::menu_query::{FilterParams, MenuQueryService};
use crate::infra::db::PostgresMenuStore;

use super::error::ApiError;
use super::rate_limit::RateLimiter;
use super::{db_health_response, middleware, respond};

#[derive(Clone)]
pub struct PublicState {
    pub query: Arc<MenuQueryService>,
    pub db: Arc<PostgresMenuStore>,
    pub rate_limiter: Arc<RateLimiter>,
}

pub fn build_public_router(state: PublicState) -> Router {
    let rate_state = state.clone();

    Router::new()
        .route("/api/menu", get(full_menu))
        .route("/api/menu/filtered", get(filtered_menu))
        .route("/api/menu/filter-options", get(filter_options))
        .route("/api/menu/featured", get(featured))
        .layer(axum_middleware::from_fn_with_state(
            rate_state,
            middleware::public_rate_limit,
        ))
        .route("/api/health", get(health))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .with_state(state)
}

async fn health(State(state): State<PublicState>) -> Response {
    db_health_response(state.db.health_check().await)
}

async fn full_menu(State(state): State<PublicState>) -> Result<Response, ApiError> {
    let document = state.query.full_menu().await?;
    Ok(respond::ok(document))
}

async fn filtered_menu(
    State(state): State<PublicState>,
    Query(params): Query<FilterParams>,
) -> Result<Response, ApiError> {
    let spec = params.into_spec()?;
    let dishes = state.query.filtered_menu(&spec).await?;
    Ok(respond::ok(dishes))
}

async fn filter_options(State(state): State<PublicState>) -> Result<Response, ApiError> {
    let payload = state.query.filter_options().await?;
    Ok(respond::ok(payload))
}

async fn featured(State(state): State<PublicState>) -> Result<Response, ApiError> {
    let dishes = state.query.featured().await?;
    Ok(respond::ok(dishes))
}
