use actix_web::{HttpResponse, web};
use anyhow::Context;
use serde_aux::field_attributes::deserialize_option_number_from_string;
use uuid::Uuid;

use super::CartaError;
use crate::authentication::UserId;
use crate::domain::{CartaId, ReadStatus};
use crate::storage::{ReadReceipt, Storage, StorageError};

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceiptBody {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub carta_id: Option<i64>,
    pub user_id: Option<Uuid>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadReceiptResponse {
    success: bool,
    message: &'static str,
    carta_id: i64,
    already_recorded: bool,
}

/// Marks a carta as read. `cartaId` is the display id; the receipt stores
/// the carta's real id.
#[tracing::instrument(
    name = "Recording a carta read",
    skip_all,
    fields(user_id = %**user_id, carta_id = tracing::field::Empty)
)]
pub async fn register_read(
    body: web::Json<ReadReceiptBody>,
    user_id: web::ReqData<UserId>,
    storage: web::Data<dyn Storage>,
) -> Result<HttpResponse, CartaError> {
    let ReadReceiptBody { carta_id, user_id: requested_user } = body.into_inner();
    let session_user = **user_id;
    if requested_user.is_some_and(|requested| requested != session_user) {
        return Err(CartaError::Forbidden);
    }
    let carta_id = carta_id
        .ok_or_else(|| CartaError::ValidationError("ID da carta é obrigatório".into()))
        .and_then(|id| {
            CartaId::parse(id)
                .map_err(|_| CartaError::ValidationError("ID da carta inválido".into()))
        })?;

    let carta = storage
        .find_carta(carta_id)
        .await
        .context("Failed to fetch the carta.")?
        .ok_or(CartaError::NotFound)?;
    tracing::Span::current().record("carta_id", carta.id);

    let receipt = ReadReceipt {
        carta_id: carta.id,
        account_user_id: session_user,
        status: ReadStatus::Read.as_str().to_string(),
    };
    let already_recorded = match storage.insert_read_receipt(&receipt).await {
        Ok(()) => false,
        Err(StorageError::Conflict(_)) => true,
        Err(e) => {
            return Err(anyhow::Error::from(e)
                .context("Failed to store the read receipt.")
                .into());
        }
    };

    Ok(HttpResponse::Ok().json(ReadReceiptResponse {
        success: true,
        message: if already_recorded {
            "Leitura já registrada anteriormente"
        } else {
            "Leitura registrada com sucesso"
        },
        carta_id: carta.id,
        already_recorded,
    }))
}
