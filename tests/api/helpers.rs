use std::sync::Arc;

use edificacao::{
    configuration::{DatabaseSettings, Settings, StorageBackend, get_configuration},
    startup::Application,
    storage::{Carta, InMemoryStorage, PostgresStorage, Storage},
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use serde_json::{Value, json};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp<S = InMemoryStorage> {
    pub address: String,
    pub port: u16,
    pub storage: Arc<S>,
    pub api_client: reqwest::Client,
}

pub struct PostgresTestApp {
    pub app: TestApp<PostgresStorage>,
    pub db_pool: PgPool,
}

pub struct TestUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl TestUser {
    pub fn generate() -> Self {
        Self {
            email: format!("leitor-{}@chamado.com", Uuid::new_v4()),
            password: "senha-secreta".into(),
            name: "Leitor Fiel".into(),
        }
    }

    pub fn register_body(&self) -> Value {
        json!({ "email": self.email, "password": self.password, "name": self.name })
    }

    pub fn login_body(&self) -> Value {
        json!({ "email": self.email, "password": self.password })
    }
}

impl<S> TestApp<S> {
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> reqwest::Response {
        self.api_client
            .post(format!("{}{}", self.address, path))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_subscribe(&self, email: &str) -> reqwest::Response {
        self.post_json("/api/subscribe", &json!({ "email": email }))
            .await
    }

    pub async fn post_register(&self, user: &TestUser) -> reqwest::Response {
        self.post_json("/api/auth/register", &user.register_body())
            .await
    }

    pub async fn post_login(&self, user: &TestUser) -> reqwest::Response {
        self.post_json("/api/auth/login", &user.login_body()).await
    }

    pub async fn post_logout(&self) -> reqwest::Response {
        self.post_json("/api/logout", &json!({})).await
    }
}

impl TestApp<InMemoryStorage> {
    pub fn seed_carta(&self, id: i64, display_id: i32, title: &str) {
        self.storage
            .seed_carta(Carta {
                id,
                id_sumary_carta: display_id,
                title: title.into(),
                body: format!("Conteúdo da {title}"),
                created_at: None,
            })
            .expect("Failed to seed carta.");
    }
}

fn test_configuration() -> Settings {
    let mut c = get_configuration().expect("Failed to read configuration.");
    c.app.port = 0;
    c.app.secure_cookies = false;
    c
}

async fn spawn_app_with<S: Storage + 'static>(config: Settings, storage: Arc<S>) -> TestApp<S> {
    Lazy::force(&TRACING);

    let app = Application::build_with_storage(config, storage.clone())
        .expect("Failed to build application.");
    let port = app.port();
    let _ = tokio::spawn(app.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap();

    TestApp {
        address: format!("http://127.0.0.1:{port}"),
        port,
        storage,
        api_client,
    }
}

pub async fn spawn_app() -> TestApp {
    let mut config = test_configuration();
    config.storage.backend = StorageBackend::Memory;
    spawn_app_with(config, Arc::new(InMemoryStorage::new())).await
}

/// Boots the app on a fresh, migrated Postgres database. Returns `None` when
/// no database server is reachable, so these tests only run where one is.
pub async fn spawn_postgres_app() -> Option<PostgresTestApp> {
    Lazy::force(&TRACING);

    let mut config = test_configuration();
    config.storage.backend = StorageBackend::Postgres;
    config.database.database_name = Uuid::new_v4().to_string();

    let db_pool = configure_database(&config.database).await?;
    let storage = Arc::new(PostgresStorage::new(db_pool.clone()));
    let app = spawn_app_with(config, storage).await;
    Some(PostgresTestApp { app, db_pool })
}

pub async fn configure_database(config: &DatabaseSettings) -> Option<PgPool> {
    let mut connection = match PgConnection::connect_with(&config.without_db()).await {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("Postgres is not reachable, skipping: {e}");
            return None;
        }
    };

    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("Failed to create database");

    let connection_pool = PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate database");

    Some(connection_pool)
}

impl PostgresTestApp {
    pub async fn seed_carta(&self, id: i64, display_id: i32, title: &str) {
        sqlx::query(
            "INSERT INTO cartas_um_chamado_a_edificacao (id, id_sumary_carta, title, body) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(display_id)
        .bind(title)
        .bind(format!("Conteúdo da {title}"))
        .execute(&self.db_pool)
        .await
        .expect("Failed to seed carta.");
    }
}

pub async fn json_body(response: reqwest::Response) -> Value {
    response.json().await.expect("Response body was not JSON.")
}
