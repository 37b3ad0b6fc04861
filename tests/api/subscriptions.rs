use serde_json::json;

use crate::helpers::{TestUser, json_body, spawn_app};

#[tokio::test]
async fn new_visitor_is_subscribed_and_sent_to_registration() {
    let app = spawn_app().await;

    let response = app.post_subscribe("visitante@chamado.com").await;

    assert_eq!(201, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["userExists"], false);
    assert_eq!(body["subscriptionExists"], false);
    assert_eq!(body["redirect"], "register");
    assert_eq!(
        body["subscription"]["status_subscription"],
        "is_subscription_um_chamado"
    );
}

#[tokio::test]
async fn subscribing_twice_does_not_duplicate_the_subscription() {
    let app = spawn_app().await;
    app.post_subscribe("visitante@chamado.com").await;

    let response = app.post_subscribe("visitante@chamado.com").await;

    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["userExists"], false);
    assert_eq!(body["subscriptionExists"], true);
    assert_eq!(body["redirect"], "register");
    assert!(body.get("subscription").is_none());

    let status = json_body(app.get("/api/storage-status").await).await;
    assert_eq!(status["counts"]["subscriptions"], 1);
}

#[tokio::test]
async fn registered_user_without_subscription_is_subscribed() {
    let app = spawn_app().await;
    let user = TestUser::generate();
    app.post_register(&user).await;

    let response = app.post_subscribe(&user.email).await;

    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["userExists"], true);
    assert_eq!(body["subscriptionExists"], false);
    assert!(body.get("redirect").is_none());
}

#[tokio::test]
async fn registered_and_subscribed_user_is_told_so() {
    let app = spawn_app().await;
    let user = TestUser::generate();
    app.post_register(&user).await;
    app.post_subscribe(&user.email).await;

    let response = app.post_subscribe(&user.email).await;

    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["userExists"], true);
    assert_eq!(body["subscriptionExists"], true);
}

#[tokio::test]
async fn subscribe_returns_400_for_missing_or_invalid_email() {
    let app = spawn_app().await;
    let test_cases = vec![
        (json!({}), "missing the email"),
        (json!({ "email": "" }), "empty email"),
        (json!({ "email": "definitely-not-an-email" }), "invalid email"),
        (json!({ "email": 42 }), "non string email"),
    ];

    for (body, description) in test_cases {
        let response = app.post_json("/api/subscribe", &body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 Bad Request when the payload was {}.",
            description
        );
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn emails_are_trimmed_before_matching() {
    let app = spawn_app().await;
    app.post_subscribe("visitante@chamado.com").await;

    let response = app.post_subscribe("  visitante@chamado.com ").await;

    let body = json_body(response).await;
    assert_eq!(body["subscriptionExists"], true);
    assert_eq!(body["email"], "visitante@chamado.com");
}

#[tokio::test]
async fn emails_differing_only_in_case_are_the_same_subscriber() {
    let app = spawn_app().await;

    let first = app.post_subscribe("Leitor@Chamado.com").await;
    assert_eq!(201, first.status().as_u16());

    let second = app.post_subscribe("leitor@chamado.com").await;
    assert_eq!(200, second.status().as_u16());
    assert_eq!(json_body(second).await["subscriptionExists"], true);

    let status = json_body(app.get("/api/storage-status").await).await;
    assert_eq!(status["counts"]["subscriptions"], 1);
}
