//! HTTP surface tests driven through the routers with `tower::oneshot`:
//! admin authentication, parameter validation, envelopes, rate limiting.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use piatto::application::admin_menu::AdminMenuService;
use piatto::application::menu_query::MenuQueryService;
use piatto::cache::{CacheConfig, MenuCache};
use piatto::infra::db::PostgresMenuStore;
use piatto::infra::http::{
    AdminState, PublicState, RateLimiter, build_admin_router, build_public_router,
};

use common::{InMemoryCacheBackend, InMemoryMenuRepo, dish, document, option};

const ADMIN_TOKEN: &str = "sesame";

/// A pool that parses its URL but never connects; none of these tests
/// reach Postgres.
fn lazy_store() -> Arc<PostgresMenuStore> {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://piatto@127.0.0.1:5432/piatto")
        .expect("valid url");
    Arc::new(PostgresMenuStore::new(pool, Duration::from_secs(1)))
}

fn seeded_repo() -> Arc<InMemoryMenuRepo> {
    Arc::new(InMemoryMenuRepo::with_document(document(vec![
        (
            "Curry",
            vec![dish("d1", "Korma", 1, vec![option("a", 9.5)])],
        ),
        ("Rice", vec![dish("d2", "Pilau", 2, vec![option("c", 3.5)])]),
    ])))
}

fn public_router(max_requests: u32) -> axum::Router {
    let repo = seeded_repo();
    let cache = Arc::new(MenuCache::new(Arc::new(InMemoryCacheBackend::new())));
    let query = Arc::new(MenuQueryService::new(repo, cache, CacheConfig::default()));
    build_public_router(PublicState {
        query,
        db: lazy_store(),
        rate_limiter: Arc::new(RateLimiter::new(Duration::from_secs(60), max_requests)),
    })
}

fn admin_router() -> axum::Router {
    let repo = seeded_repo();
    let cache = Arc::new(MenuCache::new(Arc::new(InMemoryCacheBackend::new())));
    let admin = Arc::new(AdminMenuService::new(repo, cache));
    build_admin_router(AdminState {
        admin,
        db: lazy_store(),
        admin_token: Arc::from(ADMIN_TOKEN),
    })
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn authed(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn public_menu_is_wrapped_in_the_success_envelope() {
    let response = public_router(100)
        .oneshot(get("/api/menu"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], Value::Bool(true));
    assert_eq!(body["data"]["categories"].as_array().map(Vec::len), Some(2));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn filtered_menu_accepts_comma_separated_params() {
    let response = public_router(100)
        .oneshot(get("/api/menu/filtered?spiceLevel=1&categories=Curry,Rice"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let dishes = body["data"].as_array().expect("array");
    assert_eq!(dishes.len(), 1);
    assert_eq!(dishes[0]["dish_id"], "d1");
    assert!(dishes[0]["lowestPrice"].is_number());
}

#[tokio::test]
async fn out_of_range_spice_level_is_a_bad_request() {
    let response = public_router(100)
        .oneshot(get("/api/menu/filtered?spiceLevel=9"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn unknown_query_parameters_are_rejected() {
    let response = public_router(100)
        .oneshot(get("/api/menu/filtered?bogus=1"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn filter_options_include_the_static_spice_scale() {
    let response = public_router(100)
        .oneshot(get("/api/menu/filter-options"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(
        body["data"]["spiceLevels"],
        serde_json::json!([1, 2, 3, 4, 5])
    );
    assert!(body["data"]["dishTypes"].is_array());
    assert!(body["data"]["calorieRanges"].is_array());
}

#[tokio::test]
async fn public_requests_are_rate_limited() {
    let router = public_router(2);

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(get("/api/menu"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router.oneshot(get("/api/menu")).await.expect("response");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn admin_routes_require_the_bearer_token() {
    let router = admin_router();

    let response = router
        .clone()
        .oneshot(get("/admin/menu"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/admin/menu")
        .header(header::AUTHORIZATION, "Bearer open-sesame")
        .body(Body::empty())
        .expect("request");
    let response = router.oneshot(wrong).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_menu_read_works_with_the_token() {
    let response = admin_router()
        .oneshot(authed("GET", "/admin/menu", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], Value::Bool(true));
}

#[tokio::test]
async fn admin_add_dish_returns_created_with_assigned_ids() {
    let payload = serde_json::json!({
        "category_id": "cat-0",
        "dish": {
            "dish_title": "Vindaloo",
            "spice_level": 4,
            "options": [{
                "option_name": "Lamb",
                "price": 11.5,
                "dish_type": ["Lamb"],
                "calorie_range": "600+"
            }]
        }
    });
    let response = admin_router()
        .oneshot(authed(
            "POST",
            "/admin/menu/dish",
            Some(&payload.to_string()),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["message"], "dish added");
    assert_ne!(body["data"]["dish_id"], "");
    assert_ne!(body["data"]["options"][0]["option_id"], "");
}

#[tokio::test]
async fn admin_update_dish_clears_the_image_on_explicit_null() {
    let router = admin_router();

    let set = authed(
        "PUT",
        "/admin/menu/dish/d1",
        Some(r#"{"image_url": "https://img.example/korma.jpg"}"#),
    );
    let response = router.clone().oneshot(set).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["image_url"], "https://img.example/korma.jpg");

    let clear = authed("PUT", "/admin/menu/dish/d1", Some(r#"{"image_url": null}"#));
    let response = router.oneshot(clear).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["image_url"], Value::Null);
}

#[tokio::test]
async fn admin_delete_missing_dish_is_not_found() {
    let response = admin_router()
        .oneshot(authed("DELETE", "/admin/menu/dish/ghost", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn admin_cache_clear_reports_success() {
    let response = admin_router()
        .oneshot(authed("POST", "/admin/cache/clear", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["message"], "cache cleared");
}
