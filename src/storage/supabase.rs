use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    ACCOUNTS_TABLE, AccountUser, AuthSession, CARTAS_TABLE, Carta, Credentials, Identity,
    READ_RECEIPTS_TABLE, ReadReceipt, SUBSCRIPTIONS_TABLE, Storage, StorageError, Subscription,
};
use crate::configuration::StorageBackend;
use crate::domain::{CartaId, NewAccount, SubscriberEmail, SubscriptionStatus};
use crate::supabase_client::{SupabaseClient, SupabaseError};

/// Storage backed by the hosted Supabase project. Identities live in
/// Supabase Auth, everything else in PostgREST tables.
pub struct SupabaseStorage {
    client: SupabaseClient,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

impl From<SupabaseError> for StorageError {
    fn from(e: SupabaseError) -> Self {
        if e.is_unique_violation() || e.is_already_registered() {
            StorageError::Conflict(e.into())
        } else {
            StorageError::Unexpected(e.into())
        }
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[derive(serde::Serialize)]
struct NewSubscriptionRow<'a> {
    email_subscription: &'a str,
    created_at: chrono::DateTime<Utc>,
    status_subscription: &'a str,
}

#[derive(serde::Serialize)]
struct SubscriptionStatusPatch<'a> {
    status_subscription: &'a str,
}

#[async_trait]
impl Storage for SupabaseStorage {
    fn kind(&self) -> StorageBackend {
        StorageBackend::Supabase
    }

    async fn count_subscriptions(&self) -> Result<u64, StorageError> {
        Ok(self.client.count(SUBSCRIPTIONS_TABLE).await?)
    }

    async fn find_subscription(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscription>, StorageError> {
        let rows: Vec<Subscription> = self
            .client
            .select(SUBSCRIPTIONS_TABLE, &[("email_subscription", eq(email))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_subscription(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Subscription, StorageError> {
        let row = NewSubscriptionRow {
            email_subscription: email.as_ref(),
            created_at: Utc::now(),
            status_subscription: SubscriptionStatus::Subscribed.as_str(),
        };
        Ok(self.client.insert(SUBSCRIPTIONS_TABLE, &row).await?)
    }

    async fn update_subscription_status(
        &self,
        email: &SubscriberEmail,
        status: SubscriptionStatus,
    ) -> Result<Subscription, StorageError> {
        let rows: Vec<Subscription> = self
            .client
            .update(
                SUBSCRIPTIONS_TABLE,
                &[("email_subscription", eq(email))],
                &SubscriptionStatusPatch {
                    status_subscription: status.as_str(),
                },
            )
            .await?;
        rows.into_iter()
            .next()
            .with_context(|| format!("No subscription matched {email} during update."))
            .map_err(StorageError::Unexpected)
    }

    async fn create_identity(&self, account: &NewAccount) -> Result<Identity, StorageError> {
        let user = self
            .client
            .admin_create_user(
                account.email.as_ref(),
                account.password.secret(),
                account.name.as_ref(),
            )
            .await?;
        Ok(Identity {
            id: user.id,
            email: user.email.unwrap_or_else(|| account.email.to_string()),
            created_at: user.created_at,
        })
    }

    // Supabase Auth offers no lookup by email to anonymous clients, the
    // profile table is the source of truth for "this email has an account".
    async fn find_identity_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Identity>, StorageError> {
        let account = self.find_account_by_email(email).await?;
        Ok(account.and_then(|account| {
            account.user_id.map(|id| Identity {
                id,
                email: account.email,
                created_at: Some(account.created_at),
            })
        }))
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<AuthSession, StorageError> {
        let grant = self
            .client
            .sign_in_with_password(&credentials.email, &credentials.password)
            .await
            .map_err(|e| {
                if e.is_invalid_credentials() {
                    StorageError::InvalidCredentials(e.into())
                } else {
                    StorageError::Unexpected(e.into())
                }
            })?;
        let tokens = grant.tokens();
        Ok(AuthSession {
            identity: Identity {
                id: grant.user.id,
                email: grant.user.email.unwrap_or(credentials.email),
                created_at: grant.user.created_at,
            },
            tokens: Some(tokens),
        })
    }

    async fn find_account_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<AccountUser>, StorageError> {
        let rows: Vec<AccountUser> = self
            .client
            .select(ACCOUNTS_TABLE, &[("email", eq(email))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_account_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<AccountUser>, StorageError> {
        let rows: Vec<AccountUser> = self
            .client
            .select(ACCOUNTS_TABLE, &[("user_id", eq(user_id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_account(&self, account: &AccountUser) -> Result<AccountUser, StorageError> {
        Ok(self.client.insert(ACCOUNTS_TABLE, account).await?)
    }

    async fn update_account(
        &self,
        email: &SubscriberEmail,
        account: &AccountUser,
    ) -> Result<AccountUser, StorageError> {
        let rows: Vec<AccountUser> = self
            .client
            .update(ACCOUNTS_TABLE, &[("email", eq(email))], account)
            .await?;
        rows.into_iter()
            .next()
            .with_context(|| format!("No account row matched {email} during update."))
            .map_err(StorageError::Unexpected)
    }

    async fn list_cartas(&self) -> Result<Vec<Carta>, StorageError> {
        let mut cartas: Vec<Carta> = self.client.select(CARTAS_TABLE, &[]).await?;
        cartas.sort_by_key(|c| c.id_sumary_carta);
        Ok(cartas)
    }

    async fn find_carta(&self, id: CartaId) -> Result<Option<Carta>, StorageError> {
        let rows: Vec<Carta> = self
            .client
            .select(CARTAS_TABLE, &[("id_sumary_carta", eq(id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_read_receipt(&self, receipt: &ReadReceipt) -> Result<(), StorageError> {
        Ok(self.client.insert_minimal(READ_RECEIPTS_TABLE, receipt).await?)
    }
}
