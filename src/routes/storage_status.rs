use std::time::Instant;

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};

use crate::storage::Storage;

#[derive(serde::Serialize)]
struct Counts {
    subscriptions: u64,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StorageOnline {
    status: &'static str,
    message: &'static str,
    storage: &'static str,
    timestamp: DateTime<Utc>,
    response_time: String,
    counts: Counts,
}

#[derive(serde::Serialize)]
struct StorageUnavailable {
    status: &'static str,
    message: &'static str,
    storage: &'static str,
    details: String,
    timestamp: DateTime<Utc>,
}

#[tracing::instrument(name = "Checking storage status", skip(storage))]
pub async fn storage_status(storage: web::Data<dyn Storage>) -> HttpResponse {
    let started = Instant::now();
    let backend = storage.kind().as_str();

    match storage.count_subscriptions().await {
        Ok(subscriptions) => HttpResponse::Ok().json(StorageOnline {
            status: "online",
            message: "Conexão com o banco de dados estabelecida com sucesso",
            storage: backend,
            timestamp: Utc::now(),
            response_time: format!("{}ms", started.elapsed().as_millis()),
            counts: Counts { subscriptions },
        }),
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Storage status check failed"
            );
            HttpResponse::InternalServerError().json(StorageUnavailable {
                status: "error",
                message: "Erro ao conectar com o banco de dados",
                storage: backend,
                details: e.to_string(),
                timestamp: Utc::now(),
            })
        }
    }
}
