use anyhow::Context;

use super::SubscribeError;
use crate::domain::SubscriberEmail;
use crate::routes::non_blank;
use crate::storage::{Storage, StorageError, Subscription};

pub const MISSING_EMAIL: &str = "Email é obrigatório";
pub const INVALID_EMAIL: &str = "Email inválido. Por favor, forneça um email válido";

#[derive(Debug)]
pub enum SubscriptionOutcome {
    Existing(Subscription),
    Created(Subscription),
}

/// Finds the subscription for `email`, creating it when missing.
///
/// Concurrent requests for the same address race on the unique constraint:
/// the loser gets a conflict and returns the winner's row.
#[tracing::instrument(name = "Ensuring a subscription exists", skip(storage))]
pub async fn ensure_subscription(
    storage: &dyn Storage,
    email: &SubscriberEmail,
) -> Result<SubscriptionOutcome, anyhow::Error> {
    if let Some(existing) = storage
        .find_subscription(email)
        .await
        .context("Failed to look up the subscription.")?
    {
        return Ok(SubscriptionOutcome::Existing(existing));
    }

    match storage.insert_subscription(email).await {
        Ok(created) => Ok(SubscriptionOutcome::Created(created)),
        Err(StorageError::Conflict(_)) => {
            tracing::info!("Subscription was created concurrently, reading it back");
            let existing = storage
                .find_subscription(email)
                .await
                .context("Failed to re-read the subscription after a conflict.")?
                .context("Subscription missing after a conflicting insert.")?;
            Ok(SubscriptionOutcome::Existing(existing))
        }
        Err(e) => Err(anyhow::Error::from(e).context("Failed to insert a new subscription.")),
    }
}

pub fn parse_email(email: Option<String>) -> Result<SubscriberEmail, SubscribeError> {
    let email = non_blank(email).ok_or_else(|| SubscribeError::ValidationError(MISSING_EMAIL.into()))?;
    SubscriberEmail::parse(email).map_err(|e| {
        tracing::info!(error = %e, "Rejected subscription email");
        SubscribeError::ValidationError(INVALID_EMAIL.into())
    })
}
