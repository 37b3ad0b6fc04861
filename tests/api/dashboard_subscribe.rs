use chrono::Utc;
use edificacao::storage::Subscription;
use serde_json::json;

use crate::helpers::{json_body, spawn_app};

#[tokio::test]
async fn dashboard_subscribe_creates_then_reports_existing() {
    let app = spawn_app().await;
    let body = json!({ "email": "painel@chamado.com" });

    let first = app.post_json("/api/dashboard-subscribe", &body).await;
    assert_eq!(201, first.status().as_u16());
    let first = json_body(first).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["subscription"]["email_subscription"], "painel@chamado.com");

    let second = app.post_json("/api/dashboard-subscribe", &body).await;
    assert_eq!(200, second.status().as_u16());
    let second = json_body(second).await;
    assert_eq!(second["message"], "Usuário já está inscrito");
    assert_eq!(second["subscription"], first["subscription"]);
}

#[tokio::test]
async fn dashboard_subscribe_rejects_invalid_email() {
    let app = spawn_app().await;

    let response = app
        .post_json("/api/dashboard-subscribe", &json!({ "email": "nada" }))
        .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn dashboard_subscribe_repairs_a_row_without_the_subscribed_status() {
    let app = spawn_app().await;
    app.storage
        .seed_subscription(Subscription {
            email_subscription: "painel@chamado.com".into(),
            created_at: Utc::now(),
            status_subscription: None,
        })
        .unwrap();

    let response = app
        .post_json(
            "/api/dashboard-subscribe",
            &json!({ "email": "painel@chamado.com" }),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["message"], "Sua inscrição foi atualizada com sucesso!");
    assert_eq!(
        body["subscription"]["status_subscription"],
        "is_subscription_um_chamado"
    );

    let again = json_body(
        app.post_json(
            "/api/dashboard-subscribe",
            &json!({ "email": "painel@chamado.com" }),
        )
        .await,
    )
    .await;
    assert_eq!(again["message"], "Usuário já está inscrito");
}
