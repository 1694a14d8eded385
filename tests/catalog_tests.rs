use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use storefront::api::AppState;
use storefront::config::Config;
use storefront::db::NewProduct;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let state = storefront::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    (storefront::api::router(state.clone()), state)
}

async fn seed_products(state: &Arc<AppState>) {
    for (title, price) in [
        ("Blue SHIRT", 19.99),
        ("Red Shirt Slim", 24.99),
        ("Canvas Tote Bag", 14.50),
        ("Wool Socks", 7.99),
    ] {
        state
            .store()
            .insert_product(NewProduct {
                title: title.to_string(),
                description: format!("{title} from the fall collection"),
                price,
                image: "products/images/placeholder.jpg".to_string(),
            })
            .await
            .unwrap();
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn titles(products: &serde_json::Value) -> Vec<String> {
    products
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_index_lists_all_products() {
    let (app, state) = spawn_app().await;
    seed_products(&state).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 4);
    assert_eq!(body["data"]["query"], "");
}

#[tokio::test]
async fn test_search_is_case_insensitive_substring() {
    let (app, state) = spawn_app().await;
    seed_products(&state).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/?q=shirt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let found = titles(&body["data"]["products"]);
    assert_eq!(found, vec!["Blue SHIRT", "Red Shirt Slim"]);
    assert_eq!(body["data"]["query"], "shirt");
}

#[tokio::test]
async fn test_search_trims_and_handles_no_matches() {
    let (app, state) = spawn_app().await;
    seed_products(&state).await;

    // Whitespace-only queries behave like no query at all.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/?q=%20%20")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 4);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/?q=telescope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_async_refresh_gets_fragment_shape() {
    let (app, state) = spawn_app().await;
    seed_products(&state).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/?q=shirt")
                .header("X-Requested-With", "XMLHttpRequest")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // The fragment carries the grid only; no echoed query.
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 2);
    assert!(body["data"].get("query").is_none());
}

#[tokio::test]
async fn test_static_pages_respond() {
    let (app, _) = spawn_app().await;

    for path in [
        "/services",
        "/help",
        "/contact-us",
        "/about",
        "/terms-of-use",
        "/privacy-policy",
        "/return",
        "/warranty",
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "page {path}");
        let body = body_json(response).await;
        assert_eq!(body["data"]["slug"], path.trim_start_matches('/'));
    }
}
