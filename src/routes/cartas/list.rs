use actix_web::{HttpResponse, web};
use anyhow::Context;

use super::CartaError;
use crate::storage::Storage;

#[tracing::instrument(name = "Listing cartas", skip(storage))]
pub async fn list_cartas(storage: web::Data<dyn Storage>) -> Result<HttpResponse, CartaError> {
    let cartas = storage
        .list_cartas()
        .await
        .context("Failed to list cartas.")?;
    Ok(HttpResponse::Ok().json(cartas))
}
