use crate::helpers::{json_body, spawn_app};

#[tokio::test]
async fn healthcheck_reports_ok_and_the_backend() {
    let app = spawn_app().await;

    let response = app.get("/api/healthcheck").await;

    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn app_listens_on_the_reported_port() {
    let app = spawn_app().await;
    assert_ne!(app.port, 0);
    assert!(app.address.ends_with(&app.port.to_string()));
}

#[tokio::test]
async fn storage_status_counts_subscriptions() {
    let app = spawn_app().await;
    app.post_subscribe("um@chamado.com").await;
    app.post_subscribe("dois@chamado.com").await;

    let response = app.get("/api/storage-status").await;

    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["status"], "online");
    assert_eq!(body["counts"]["subscriptions"], 2);
    let response_time = body["responseTime"].as_str().unwrap();
    assert!(response_time.ends_with("ms"));
}

#[tokio::test]
async fn malformed_json_is_rejected_with_a_json_error() {
    let app = spawn_app().await;

    let response = app.post_raw("/api/subscribe", "{\"email\": ").await;

    assert_eq!(400, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}
