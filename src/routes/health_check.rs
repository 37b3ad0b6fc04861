use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};

use crate::configuration::StorageBackend;
use crate::storage::Storage;

#[derive(serde::Serialize)]
struct HealthReport {
    status: &'static str,
    timestamp: DateTime<Utc>,
    version: &'static str,
    storage: StorageBackend,
}

pub async fn health_check(storage: web::Data<dyn Storage>) -> HttpResponse {
    HttpResponse::Ok().json(HealthReport {
        status: "ok",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        storage: storage.kind(),
    })
}
