use actix_web::{HttpResponse, web};
use anyhow::Context;

use super::CartaError;
use crate::domain::CartaId;
use crate::storage::Storage;

pub fn parse_carta_id(raw: &str) -> Result<CartaId, CartaError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| e.to_string())
        .and_then(CartaId::parse)
        .map_err(|e| {
            tracing::info!(error = %e, "Rejected carta id");
            CartaError::ValidationError("ID da carta inválido".into())
        })
}

#[tracing::instrument(name = "Fetching a carta", skip(storage))]
pub async fn get_carta(
    path: web::Path<String>,
    storage: web::Data<dyn Storage>,
) -> Result<HttpResponse, CartaError> {
    let id = parse_carta_id(&path)?;
    let carta = storage
        .find_carta(id)
        .await
        .context("Failed to fetch the carta.")?
        .ok_or(CartaError::NotFound)?;
    Ok(HttpResponse::Ok().json(carta))
}
