use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use uuid::Uuid;

use super::{
    AccountUser, AuthSession, Carta, Credentials, Identity, ReadReceipt, Storage, StorageError,
    Subscription,
};
use crate::authentication::{hash_password, validate_password};
use crate::configuration::StorageBackend;
use crate::domain::{CartaId, NewAccount, SubscriberEmail, SubscriptionStatus};

struct StoredIdentity {
    identity: Identity,
    password_hash: SecretString,
}

#[derive(Default)]
struct Tables {
    subscriptions: HashMap<String, Subscription>,
    identities: HashMap<String, StoredIdentity>,
    accounts: HashMap<String, AccountUser>,
    cartas: HashMap<i32, Carta>,
    read_receipts: HashSet<(i64, Uuid)>,
}

/// Process-local storage for development and tests. Keys mirror the unique
/// constraints of the real schema.
#[derive(Default)]
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|_| StorageError::Unexpected(anyhow!("In-memory storage lock was poisoned.")))
    }

    /// Cartas are read-only through [`Storage`], content is loaded here.
    pub fn seed_carta(&self, carta: Carta) -> Result<(), StorageError> {
        self.tables()?.cartas.insert(carta.id_sumary_carta, carta);
        Ok(())
    }

    /// Stores a subscription row as is, whatever its status.
    pub fn seed_subscription(&self, subscription: Subscription) -> Result<(), StorageError> {
        self.tables()?
            .subscriptions
            .insert(subscription.email_subscription.clone(), subscription);
        Ok(())
    }

    pub fn read_receipts(&self) -> Result<Vec<(i64, Uuid)>, StorageError> {
        Ok(self.tables()?.read_receipts.iter().copied().collect())
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    fn kind(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn count_subscriptions(&self) -> Result<u64, StorageError> {
        Ok(self.tables()?.subscriptions.len() as u64)
    }

    async fn find_subscription(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscription>, StorageError> {
        Ok(self.tables()?.subscriptions.get(email.as_ref()).cloned())
    }

    async fn insert_subscription(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Subscription, StorageError> {
        let mut tables = self.tables()?;
        if tables.subscriptions.contains_key(email.as_ref()) {
            return Err(StorageError::Conflict(anyhow!(
                "{email} is already subscribed."
            )));
        }
        let subscription = Subscription {
            email_subscription: email.to_string(),
            created_at: Utc::now(),
            status_subscription: Some(SubscriptionStatus::Subscribed.as_str().to_string()),
        };
        tables
            .subscriptions
            .insert(email.to_string(), subscription.clone());
        Ok(subscription)
    }

    async fn update_subscription_status(
        &self,
        email: &SubscriberEmail,
        status: SubscriptionStatus,
    ) -> Result<Subscription, StorageError> {
        let mut tables = self.tables()?;
        let stored = tables
            .subscriptions
            .get_mut(email.as_ref())
            .ok_or_else(|| anyhow!("No subscription matched {email} during update."))?;
        stored.status_subscription = Some(status.as_str().to_string());
        Ok(stored.clone())
    }

    async fn create_identity(&self, account: &NewAccount) -> Result<Identity, StorageError> {
        if self.tables()?.identities.contains_key(account.email.as_ref()) {
            return Err(StorageError::Conflict(anyhow!(
                "{} is already registered.",
                account.email
            )));
        }
        let password_hash = hash_password(account.password.secret().clone()).await?;

        let mut tables = self.tables()?;
        // Re-checked after hashing, another registration may have won meanwhile.
        if tables.identities.contains_key(account.email.as_ref()) {
            return Err(StorageError::Conflict(anyhow!(
                "{} is already registered.",
                account.email
            )));
        }
        let identity = Identity {
            id: Uuid::new_v4(),
            email: account.email.to_string(),
            created_at: Some(Utc::now()),
        };
        tables.identities.insert(
            account.email.to_string(),
            StoredIdentity {
                identity: identity.clone(),
                password_hash,
            },
        );
        Ok(identity)
    }

    async fn find_identity_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Identity>, StorageError> {
        Ok(self
            .tables()?
            .identities
            .get(email.as_ref())
            .map(|stored| stored.identity.clone()))
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<AuthSession, StorageError> {
        let (identity, stored_hash) = match self.tables()?.identities.get(credentials.email.trim())
        {
            Some(stored) => (
                Some(stored.identity.clone()),
                Some(stored.password_hash.clone()),
            ),
            None => (None, None),
        };
        validate_password(stored_hash, credentials.password).await?;
        let identity = identity
            .ok_or_else(|| anyhow!("Credentials validated without a matching account."))?;
        Ok(AuthSession {
            identity,
            tokens: None,
        })
    }

    async fn find_account_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<AccountUser>, StorageError> {
        Ok(self.tables()?.accounts.get(email.as_ref()).cloned())
    }

    async fn find_account_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<AccountUser>, StorageError> {
        Ok(self
            .tables()?
            .accounts
            .values()
            .find(|account| account.user_id == Some(user_id))
            .cloned())
    }

    async fn insert_account(&self, account: &AccountUser) -> Result<AccountUser, StorageError> {
        let mut tables = self.tables()?;
        if tables.accounts.contains_key(&account.email) {
            return Err(StorageError::Conflict(anyhow!(
                "An account for {} already exists.",
                account.email
            )));
        }
        tables
            .accounts
            .insert(account.email.clone(), account.clone());
        Ok(account.clone())
    }

    async fn update_account(
        &self,
        email: &SubscriberEmail,
        account: &AccountUser,
    ) -> Result<AccountUser, StorageError> {
        let mut tables = self.tables()?;
        let stored = tables
            .accounts
            .get_mut(email.as_ref())
            .ok_or_else(|| anyhow!("No account row matched {email} during update."))?;
        *stored = AccountUser {
            email: email.to_string(),
            ..account.clone()
        };
        Ok(stored.clone())
    }

    async fn list_cartas(&self) -> Result<Vec<Carta>, StorageError> {
        let mut cartas: Vec<Carta> = self.tables()?.cartas.values().cloned().collect();
        cartas.sort_by_key(|c| c.id_sumary_carta);
        Ok(cartas)
    }

    async fn find_carta(&self, id: CartaId) -> Result<Option<Carta>, StorageError> {
        Ok(self.tables()?.cartas.get(&id.get()).cloned())
    }

    async fn insert_read_receipt(&self, receipt: &ReadReceipt) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        if !tables.cartas.values().any(|c| c.id == receipt.carta_id) {
            return Err(StorageError::Unexpected(anyhow!(
                "Carta {} does not exist.",
                receipt.carta_id
            )));
        }
        if !tables
            .read_receipts
            .insert((receipt.carta_id, receipt.account_user_id))
        {
            return Err(StorageError::Conflict(anyhow!(
                "Carta {} was already read by {}.",
                receipt.carta_id,
                receipt.account_user_id
            )));
        }
        Ok(())
    }
}
