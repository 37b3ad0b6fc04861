use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::routes::{ErrorBody, error_chain_fmt};

#[derive(thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Email already registered.")]
    AlreadyRegistered(#[source] anyhow::Error),
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error("No profile for the logged in user.")]
    ProfileNotFound,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::AlreadyRegistered(_) => StatusCode::CONFLICT,
            AuthError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            AuthError::ProfileNotFound => StatusCode::NOT_FOUND,
            AuthError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AuthError::ValidationError(message) => ErrorBody::new(message),
            AuthError::AlreadyRegistered(_) => ErrorBody::new("Este email já está cadastrado"),
            AuthError::InvalidCredentials(_) => ErrorBody::new("Email ou senha incorretos"),
            AuthError::ProfileNotFound => ErrorBody::new("Perfil de usuário não encontrado"),
            AuthError::UnexpectedError(e) => {
                ErrorBody::new("Erro interno do servidor").with_details(e)
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
