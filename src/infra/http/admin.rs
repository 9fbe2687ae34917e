//! Operator-facing mutation API. Every route except the health probe sits
//! behind the bearer-token guard.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware as axum_middleware,
    response::Response,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use crate::application::admin_menu::{AdminMenuService, DishPatch};
use crate::domain::menu::{Category, Dish, MenuDocument};
use crate::infra::db::PostgresMenuStore;

use super::error::ApiError;
use super::{db_health_response, middleware, respond};

#[derive(Clone)]
pub struct AdminState {
    pub admin: Arc<AdminMenuService>,
    pub db: Arc<PostgresMenuStore>,
    pub admin_token: Arc<str>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddDishRequest {
    pub category_id: String,
    pub dish: Dish,
}

pub fn build_admin_router(state: AdminState) -> Router {
    let auth_state = state.clone();

    Router::new()
        .route("/admin/menu", get(menu).put(replace_menu))
        .route("/admin/menu/dish", post(add_dish))
        .route(
            "/admin/menu/dish/{dish_id}",
            put(update_dish).delete(delete_dish),
        )
        .route(
            "/admin/menu/dish/{dish_id}/option/{option_id}",
            delete(delete_option),
        )
        .route("/admin/menu/category", post(add_category))
        .route("/admin/menu/category/{category_id}", delete(delete_category))
        .route("/admin/cache/clear", post(clear_cache))
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::admin_auth,
        ))
        .route("/admin/health", get(health))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .with_state(state)
}

async fn health(State(state): State<AdminState>) -> Response {
    db_health_response(state.db.health_check().await)
}

async fn menu(State(state): State<AdminState>) -> Result<Response, ApiError> {
    let document = state.admin.menu().await?;
    Ok(respond::ok(document))
}

async fn add_dish(
    State(state): State<AdminState>,
    Json(request): Json<AddDishRequest>,
) -> Result<Response, ApiError> {
    let dish = state
        .admin
        .add_dish(&request.category_id, request.dish)
        .await?;
    Ok(respond::created(dish, "dish added"))
}

async fn update_dish(
    State(state): State<AdminState>,
    Path(dish_id): Path<String>,
    Json(patch): Json<DishPatch>,
) -> Result<Response, ApiError> {
    let dish = state.admin.update_dish(&dish_id, patch).await?;
    Ok(respond::ok_with_message(dish, "dish updated"))
}

async fn delete_dish(
    State(state): State<AdminState>,
    Path(dish_id): Path<String>,
) -> Result<Response, ApiError> {
    state.admin.delete_dish(&dish_id).await?;
    Ok(respond::ok_with_message((), "dish deleted"))
}

async fn add_category(
    State(state): State<AdminState>,
    Json(category): Json<Category>,
) -> Result<Response, ApiError> {
    let category = state.admin.add_category(category).await?;
    Ok(respond::created(category, "category added"))
}

async fn delete_category(
    State(state): State<AdminState>,
    Path(category_id): Path<String>,
) -> Result<Response, ApiError> {
    state.admin.delete_category(&category_id).await?;
    Ok(respond::ok_with_message((), "category deleted"))
}

async fn delete_option(
    State(state): State<AdminState>,
    Path((dish_id, option_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    state.admin.delete_option(&dish_id, &option_id).await?;
    Ok(respond::ok_with_message((), "option deleted"))
}

async fn replace_menu(
    State(state): State<AdminState>,
    Json(document): Json<MenuDocument>,
) -> Result<Response, ApiError> {
    let document = state.admin.replace_menu(document).await?;
    Ok(respond::ok_with_message(document, "menu replaced"))
}

async fn clear_cache(State(state): State<AdminState>) -> Response {
    state.admin.clear_cache().await;
    respond::ok_with_message((), "cache cleared")
}
