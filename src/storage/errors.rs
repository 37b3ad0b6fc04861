use crate::routes::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum StorageError {
    #[error("A record with the same key already exists.")]
    Conflict(#[source] anyhow::Error),
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        let is_unique_violation = matches!(
            &e,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation()
        );
        if is_unique_violation {
            StorageError::Conflict(e.into())
        } else {
            StorageError::Unexpected(e.into())
        }
    }
}
