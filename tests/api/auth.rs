use edificacao::domain::{NewAccount, SubscriberEmail};
use edificacao::storage::{AccountUser, Storage};
use secrecy::SecretString;
use serde_json::json;

use crate::helpers::{TestUser, json_body, spawn_app};

#[tokio::test]
async fn register_creates_the_account_and_logs_in() {
    let app = spawn_app().await;
    let user = TestUser::generate();

    let response = app.post_register(&user).await;

    assert_eq!(201, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["email"], user.email.as_str());
    assert_eq!(body["name"], user.name.as_str());
    assert_eq!(body["accountUser"]["status"], "active");
    assert_eq!(body["accountUser"]["user_id"], body["userId"]);
    assert_eq!(body["accountUser"]["id"], body["userId"]);

    let me = app.get("/api/user").await;
    assert_eq!(200, me.status().as_u16());
    let me = json_body(me).await;
    assert_eq!(me["email"], user.email.as_str());
}

#[tokio::test]
async fn register_returns_409_for_an_existing_email() {
    let app = spawn_app().await;
    let user = TestUser::generate();
    app.post_register(&user).await;

    let response = app.post_register(&user).await;

    assert_eq!(409, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn register_returns_400_when_data_is_missing_or_invalid() {
    let app = spawn_app().await;
    let test_cases = vec![
        (json!({ "password": "senha-secreta", "name": "Leitor" }), "missing the email"),
        (json!({ "email": "a@chamado.com", "name": "Leitor" }), "missing the password"),
        (json!({ "email": "a@chamado.com", "password": "senha-secreta" }), "missing the name"),
        (json!({ "email": "a@chamado.com", "password": "", "name": "Leitor" }), "empty password"),
        (json!({ "email": "nada", "password": "senha-secreta", "name": "Leitor" }), "invalid email"),
        (json!({ "email": "a@chamado.com", "password": "123", "name": "Leitor" }), "short password"),
        (json!({ "email": "a@chamado.com", "password": "senha-secreta", "name": "<script>" }), "invalid name"),
    ];

    for (body, description) in test_cases {
        let response = app.post_json("/api/auth/register", &body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 Bad Request when the payload was {}.",
            description
        );
    }
}

#[tokio::test]
async fn register_links_a_profile_that_already_existed() {
    let app = spawn_app().await;
    let user = TestUser::generate();
    let email = SubscriberEmail::parse(user.email.clone()).unwrap();
    let stale = AccountUser {
        id: uuid::Uuid::new_v4(),
        user_id: None,
        name: "Antigo".into(),
        email: user.email.clone(),
        status: "pending".into(),
        created_at: chrono::Utc::now(),
    };
    app.storage.insert_account(&stale).await.unwrap();

    let response = app.post_register(&user).await;

    assert_eq!(201, response.status().as_u16());
    let profile = app
        .storage
        .find_account_by_email(&email)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.name, user.name);
    assert_eq!(profile.status, "active");
    assert!(profile.user_id.is_some());
}

#[tokio::test]
async fn login_returns_the_profile() {
    let app = spawn_app().await;
    let user = TestUser::generate();
    app.post_register(&user).await;
    app.post_logout().await;

    let response = app.post_login(&user).await;

    assert_eq!(200, response.status().as_u16());
    let body = json_body(response).await;
    assert_eq!(body["user"]["email"], user.email.as_str());
    assert_eq!(body["user"]["name"], user.name.as_str());
    assert!(body["session"].is_null());
    assert_eq!(200, app.get("/api/user").await.status().as_u16());
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let app = spawn_app().await;
    let user = TestUser::generate();
    app.post_register(&user).await;
    app.post_logout().await;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "email": user.email, "password": "outra-senha" }),
        )
        .await;

    assert_eq!(401, response.status().as_u16());
    assert_eq!(401, app.get("/api/user").await.status().as_u16());
}

#[tokio::test]
async fn login_with_unknown_email_is_rejected() {
    let app = spawn_app().await;

    let response = app.post_login(&TestUser::generate()).await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn login_requires_email_and_password() {
    let app = spawn_app().await;

    let response = app
        .post_json("/api/auth/login", &json!({ "email": "a@chamado.com" }))
        .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = spawn_app().await;
    let user = TestUser::generate();
    app.post_register(&user).await;
    assert_eq!(200, app.get("/api/user").await.status().as_u16());

    let response = app.post_logout().await;
    assert_eq!(200, response.status().as_u16());

    let me = app.get("/api/user").await;
    assert_eq!(401, me.status().as_u16());
    let body = json_body(me).await;
    assert_eq!(body["message"], "Não autenticado");
}

#[tokio::test]
async fn login_ignores_the_case_of_the_email() {
    let app = spawn_app().await;
    let user = TestUser::generate();
    app.post_register(&user).await;
    app.post_logout().await;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "email": user.email.to_uppercase(), "password": user.password }),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn registering_again_finishes_an_identity_without_profile() {
    let app = spawn_app().await;
    let user = TestUser::generate();
    let account = NewAccount::parse(
        user.email.clone(),
        user.name.clone(),
        SecretString::from(user.password.clone()),
    )
    .unwrap();
    app.storage.create_identity(&account).await.unwrap();

    let response = app.post_register(&user).await;

    assert_eq!(201, response.status().as_u16());
    let me = app.get("/api/user").await;
    assert_eq!(200, me.status().as_u16());
    assert_eq!(json_body(me).await["name"], user.name.as_str());
}

#[tokio::test]
async fn registering_over_an_unfinished_identity_needs_its_password() {
    let app = spawn_app().await;
    let user = TestUser::generate();
    let account = NewAccount::parse(
        user.email.clone(),
        user.name.clone(),
        SecretString::from("outra-senha-123"),
    )
    .unwrap();
    app.storage.create_identity(&account).await.unwrap();

    let response = app.post_register(&user).await;

    assert_eq!(409, response.status().as_u16());
}
