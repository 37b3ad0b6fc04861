mod errors;
mod memory;
mod models;
mod postgres;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::configuration::{Settings, StorageBackend};
use crate::domain::{CartaId, NewAccount, SubscriberEmail, SubscriptionStatus};

pub use errors::StorageError;
pub use memory::InMemoryStorage;
pub use models::{
    AccountUser, AuthSession, Carta, Credentials, Identity, ReadReceipt, SessionTokens,
    Subscription,
};
pub use postgres::{PostgresStorage, get_connection_pool};
pub use supabase::SupabaseStorage;

pub const SUBSCRIPTIONS_TABLE: &str = "subscription_um_chamado";
pub const ACCOUNTS_TABLE: &str = "account_user";
pub const CARTAS_TABLE: &str = "cartas_um_chamado_a_edificacao";
pub const READ_RECEIPTS_TABLE: &str = "status_carta";

/// Persistence for everything the API touches.
///
/// Inserts report duplicates as [`StorageError::Conflict`] so callers can
/// decide whether a duplicate is an error or an already-done operation.
#[async_trait]
pub trait Storage: Send + Sync {
    fn kind(&self) -> StorageBackend;

    // Subscriptions
    async fn count_subscriptions(&self) -> Result<u64, StorageError>;
    async fn find_subscription(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscription>, StorageError>;
    async fn insert_subscription(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Subscription, StorageError>;
    async fn update_subscription_status(
        &self,
        email: &SubscriberEmail,
        status: SubscriptionStatus,
    ) -> Result<Subscription, StorageError>;

    // Auth identities
    async fn create_identity(&self, account: &NewAccount) -> Result<Identity, StorageError>;
    async fn find_identity_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Identity>, StorageError>;
    async fn authenticate(&self, credentials: Credentials) -> Result<AuthSession, StorageError>;

    // Account profiles
    async fn find_account_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<AccountUser>, StorageError>;
    async fn find_account_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<AccountUser>, StorageError>;
    async fn insert_account(&self, account: &AccountUser) -> Result<AccountUser, StorageError>;
    async fn update_account(
        &self,
        email: &SubscriberEmail,
        account: &AccountUser,
    ) -> Result<AccountUser, StorageError>;

    // Cartas
    async fn list_cartas(&self) -> Result<Vec<Carta>, StorageError>;
    async fn find_carta(&self, id: CartaId) -> Result<Option<Carta>, StorageError>;
    async fn insert_read_receipt(&self, receipt: &ReadReceipt) -> Result<(), StorageError>;
}

#[tracing::instrument(name = "Building storage backend", skip_all, fields(backend = %settings.storage.backend.as_str()))]
pub async fn build_storage(settings: &Settings) -> Result<Arc<dyn Storage>, anyhow::Error> {
    let storage: Arc<dyn Storage> = match settings.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryStorage::new()),
        StorageBackend::Postgres => {
            let pool = get_connection_pool(&settings.database);
            if settings.database.run_migrations {
                sqlx::migrate!("./migrations").run(&pool).await?;
            }
            Arc::new(PostgresStorage::new(pool))
        }
        StorageBackend::Supabase => Arc::new(SupabaseStorage::new(settings.supabase.client()?)),
    };
    Ok(storage)
}
