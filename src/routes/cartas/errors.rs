use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::routes::{ErrorBody, error_chain_fmt};
use crate::storage::StorageError;

#[derive(thiserror::Error)]
pub enum CartaError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Carta not found.")]
    NotFound,
    #[error("Read receipts can only be recorded for the logged in user.")]
    Forbidden,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for CartaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StorageError> for CartaError {
    fn from(e: StorageError) -> Self {
        Self::UnexpectedError(e.into())
    }
}

impl ResponseError for CartaError {
    fn status_code(&self) -> StatusCode {
        match self {
            CartaError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CartaError::NotFound => StatusCode::NOT_FOUND,
            CartaError::Forbidden => StatusCode::FORBIDDEN,
            CartaError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            CartaError::ValidationError(message) => ErrorBody::new(message),
            CartaError::NotFound => ErrorBody::new("Carta não encontrada"),
            CartaError::Forbidden => {
                ErrorBody::new("Não é permitido registrar leitura para outro usuário")
            }
            CartaError::UnexpectedError(e) => {
                ErrorBody::new("Erro ao acessar as cartas").with_details(e)
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
