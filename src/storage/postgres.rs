use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{
    AccountUser, AuthSession, Carta, Credentials, Identity, ReadReceipt, Storage, StorageError,
    Subscription,
};
use crate::authentication::{hash_password, validate_password};
use crate::configuration::{DatabaseSettings, StorageBackend};
use crate::domain::{CartaId, NewAccount, SubscriberEmail, SubscriptionStatus};

pub fn get_connection_pool(db_config: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(db_config.with_db())
}

/// Storage talking straight to Postgres, the same schema the hosted
/// database exposes plus a local `auth_users` table for credentials.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    fn kind(&self) -> StorageBackend {
        StorageBackend::Postgres
    }

    #[tracing::instrument(name = "Counting subscriptions", skip(self))]
    async fn count_subscriptions(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscription_um_chamado")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).context("Negative subscription count.")?)
    }

    #[tracing::instrument(name = "Finding subscription by email", skip(self))]
    async fn find_subscription(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscription>, StorageError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT email_subscription, created_at, status_subscription
            FROM subscription_um_chamado
            WHERE email_subscription = $1
            "#,
        )
        .bind(email.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscription)
    }

    #[tracing::instrument(name = "Saving new subscription in the database", skip(self))]
    async fn insert_subscription(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Subscription, StorageError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscription_um_chamado (email_subscription, created_at, status_subscription)
            VALUES ($1, now(), $2)
            RETURNING email_subscription, created_at, status_subscription
            "#,
        )
        .bind(email.as_ref())
        .bind(SubscriptionStatus::Subscribed.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(subscription)
    }

    #[tracing::instrument(name = "Updating subscription status", skip(self))]
    async fn update_subscription_status(
        &self,
        email: &SubscriberEmail,
        status: SubscriptionStatus,
    ) -> Result<Subscription, StorageError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscription_um_chamado
            SET status_subscription = $1
            WHERE email_subscription = $2
            RETURNING email_subscription, created_at, status_subscription
            "#,
        )
        .bind(status.as_str())
        .bind(email.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        subscription
            .with_context(|| format!("No subscription matched {email} during update."))
            .map_err(StorageError::Unexpected)
    }

    #[tracing::instrument(name = "Creating auth identity", skip(self, account), fields(email = %account.email))]
    async fn create_identity(&self, account: &NewAccount) -> Result<Identity, StorageError> {
        let password_hash = hash_password(account.password.secret().clone()).await?;
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO auth_users (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, now())
            RETURNING id, email, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account.email.as_ref())
        .bind(password_hash.expose_secret())
        .fetch_one(&self.pool)
        .await?;
        Ok(identity)
    }

    #[tracing::instrument(name = "Finding auth identity by email", skip(self))]
    async fn find_identity_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Identity>, StorageError> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT id, email, created_at FROM auth_users WHERE email = $1",
        )
        .bind(email.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(identity)
    }

    #[tracing::instrument(name = "Authenticating credentials", skip(self, credentials), fields(email = %credentials.email))]
    async fn authenticate(&self, credentials: Credentials) -> Result<AuthSession, StorageError> {
        let row: Option<(Uuid, String, String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
            "SELECT id, email, password_hash, created_at FROM auth_users WHERE email = $1",
        )
        .bind(credentials.email.trim())
        .fetch_optional(&self.pool)
        .await?;

        let stored_hash = row
            .as_ref()
            .map(|(_, _, hash, _)| SecretString::from(hash.clone()));
        validate_password(stored_hash, credentials.password).await?;

        let (id, email, _, created_at) = row
            .context("Credentials validated without a matching account.")?;
        Ok(AuthSession {
            identity: Identity {
                id,
                email,
                created_at: Some(created_at),
            },
            tokens: None,
        })
    }

    #[tracing::instrument(name = "Finding account by email", skip(self))]
    async fn find_account_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<AccountUser>, StorageError> {
        let account = sqlx::query_as::<_, AccountUser>(
            r#"
            SELECT id, user_id, name, email, status, created_at
            FROM account_user
            WHERE email = $1
            "#,
        )
        .bind(email.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    #[tracing::instrument(name = "Finding account by user id", skip(self))]
    async fn find_account_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<AccountUser>, StorageError> {
        let account = sqlx::query_as::<_, AccountUser>(
            r#"
            SELECT id, user_id, name, email, status, created_at
            FROM account_user
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    #[tracing::instrument(name = "Saving new account profile", skip(self, account), fields(email = %account.email))]
    async fn insert_account(&self, account: &AccountUser) -> Result<AccountUser, StorageError> {
        let account = sqlx::query_as::<_, AccountUser>(
            r#"
            INSERT INTO account_user (id, user_id, name, email, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, name, email, status, created_at
            "#,
        )
        .bind(account.id)
        .bind(account.user_id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.status)
        .bind(account.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(account)
    }

    #[tracing::instrument(name = "Updating account profile", skip(self, account))]
    async fn update_account(
        &self,
        email: &SubscriberEmail,
        account: &AccountUser,
    ) -> Result<AccountUser, StorageError> {
        let account = sqlx::query_as::<_, AccountUser>(
            r#"
            UPDATE account_user
            SET id = $1, user_id = $2, name = $3, status = $4, created_at = $5
            WHERE email = $6
            RETURNING id, user_id, name, email, status, created_at
            "#,
        )
        .bind(account.id)
        .bind(account.user_id)
        .bind(&account.name)
        .bind(&account.status)
        .bind(account.created_at)
        .bind(email.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        account
            .with_context(|| format!("No account row matched {email} during update."))
            .map_err(StorageError::Unexpected)
    }

    #[tracing::instrument(name = "Listing cartas", skip(self))]
    async fn list_cartas(&self) -> Result<Vec<Carta>, StorageError> {
        let cartas = sqlx::query_as::<_, Carta>(
            r#"
            SELECT id, id_sumary_carta, title, body, created_at
            FROM cartas_um_chamado_a_edificacao
            ORDER BY id_sumary_carta
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(cartas)
    }

    #[tracing::instrument(name = "Finding carta by display id", skip(self))]
    async fn find_carta(&self, id: CartaId) -> Result<Option<Carta>, StorageError> {
        let carta = sqlx::query_as::<_, Carta>(
            r#"
            SELECT id, id_sumary_carta, title, body, created_at
            FROM cartas_um_chamado_a_edificacao
            WHERE id_sumary_carta = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;
        Ok(carta)
    }

    #[tracing::instrument(name = "Saving read receipt", skip(self))]
    async fn insert_read_receipt(&self, receipt: &ReadReceipt) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO status_carta (carta_id, account_user_id, status)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(receipt.carta_id)
        .bind(receipt.account_user_id)
        .bind(&receipt.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
