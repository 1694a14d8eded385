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

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let state = storefront::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    (storefront::api::router(state.clone()), state)
}

fn post_report(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/report")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_form() -> serde_json::Value {
    serde_json::json!({
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "jane@example.com",
        "phone": "",
        "subject": "General",
        "address": "",
        "message": "Twenty characters!!!",
        "newsletter": false,
        "privacy": true
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_valid_submission_persists_one_row() {
    let (app, state) = spawn_app().await;

    let response = app.clone().oneshot(post_report(valid_form())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reports = state.store().list_reports().await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].name, "Jane Doe");
    assert_eq!(reports[0].email, "jane@example.com");
    assert_eq!(reports[0].subject, "General");
}

#[tokio::test]
async fn test_short_first_name_rejected() {
    let (app, state) = spawn_app().await;

    let mut form = valid_form();
    form["first_name"] = serde_json::json!("A");

    let response = app.clone().oneshot(post_report(form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(
        body["errors"][0],
        "First name is required and must be at least 2 characters."
    );
    // The submitted values come back for repopulating the form.
    assert_eq!(body["data"]["form_data"]["first_name"], "A");
    assert_eq!(body["data"]["form_data"]["last_name"], "Doe");

    assert_eq!(state.store().report_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_all_errors_reported_together() {
    let (app, state) = spawn_app().await;

    let form = serde_json::json!({
        "first_name": "A",
        "last_name": "B",
        "email": "not-an-email",
        "phone": "123",
        "subject": "",
        "address": "",
        "message": "short",
        "newsletter": false,
        "privacy": false
    });

    let response = app.clone().oneshot(post_report(form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    // Both names, email, phone, subject, message, privacy: seven failures.
    assert_eq!(body["errors"].as_array().unwrap().len(), 7);

    assert_eq!(state.store().report_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_optional_phone_is_validated_when_present() {
    let (app, state) = spawn_app().await;

    let mut form = valid_form();
    form["phone"] = serde_json::json!("12345");

    let response = app.clone().oneshot(post_report(form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errors"][0], "Please enter a valid phone number.");

    let mut form = valid_form();
    form["phone"] = serde_json::json!("+1 (555) 123-4567");
    let response = app.clone().oneshot(post_report(form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reports = state.store().list_reports().await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].phone, "+1 (555) 123-4567");
}

#[tokio::test]
async fn test_privacy_must_be_accepted() {
    let (app, state) = spawn_app().await;

    let mut form = valid_form();
    form["privacy"] = serde_json::json!(false);

    let response = app.clone().oneshot(post_report(form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["errors"][0],
        "You must agree to the Privacy Policy and Terms of Use."
    );
    assert_eq!(state.store().report_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_report_page() {
    let (app, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/report").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["slug"], "report");
}
