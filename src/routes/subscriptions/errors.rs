use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::routes::{ErrorBody, error_chain_fmt};
use crate::storage::StorageError;

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StorageError> for SubscribeError {
    fn from(e: StorageError) -> Self {
        Self::UnexpectedError(e.into())
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            SubscribeError::ValidationError(message) => ErrorBody::new(message),
            SubscribeError::UnexpectedError(e) => {
                ErrorBody::new("Erro ao processar inscrição").with_details(e)
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
