use std::net::TcpListener;
use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use tracing_actix_web::TracingLogger;

use crate::authentication::reject_anonymous_users;
use crate::configuration::Settings;
use crate::routes::{
    check_subscription, check_subscription_status, current_user, dashboard_subscribe, get_carta,
    health_check, json_error_handler, list_cartas, login, logout, query_error_handler, register,
    register_read, storage_status, subscribe,
};
use crate::storage::{Storage, build_storage};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let storage = build_storage(&config)
            .await
            .context("Failed to build the storage backend.")?;
        Self::build_with_storage(config, storage)
    }

    /// Same as [`Application::build`] with an already constructed backend.
    pub fn build_with_storage(
        config: Settings,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, anyhow::Error> {
        let address = format!("{}:{}", config.app.host, config.app.port);
        let listener =
            TcpListener::bind(&address).with_context(|| format!("Failed to bind {address}."))?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            storage,
            config.app.hmac_secret,
            config.app.secure_cookies,
        )?;

        tracing::info!(%address, port, backend = config.storage.backend.as_str(), "Application built");
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    storage: Arc<dyn Storage>,
    hmac_secret: SecretString,
    secure_cookies: bool,
) -> Result<Server, anyhow::Error> {
    let storage: web::Data<dyn Storage> = web::Data::from(storage);
    let secret_key = Key::try_from(hmac_secret.expose_secret().as_bytes())
        .map_err(|e| anyhow::anyhow!("The hmac secret cannot sign session cookies: {e:?}"))?;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(secure_cookies)
                    .build(),
            )
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(storage.clone())
            .service(
                web::scope("/api")
                    .route("/healthcheck", web::get().to(health_check))
                    .route("/storage-status", web::get().to(storage_status))
                    .route("/auth/register", web::post().to(register))
                    .route("/auth/login", web::post().to(login))
                    .route("/logout", web::post().to(logout))
                    .route("/subscribe", web::post().to(subscribe))
                    .route("/dashboard-subscribe", web::post().to(dashboard_subscribe))
                    .route(
                        "/check-subscription-status",
                        web::post().to(check_subscription_status),
                    )
                    .route("/check-subscription", web::get().to(check_subscription))
                    .service(
                        web::scope("/user")
                            .wrap(from_fn(reject_anonymous_users))
                            .route("", web::get().to(current_user)),
                    )
                    .service(
                        web::scope("/cartas")
                            .wrap(from_fn(reject_anonymous_users))
                            .route("", web::get().to(list_cartas))
                            .route("/registrar-leitura", web::post().to(register_read))
                            .route("/{id}", web::get().to(get_carta)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
