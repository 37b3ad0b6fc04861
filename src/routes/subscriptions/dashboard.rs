use actix_web::{HttpResponse, web};
use anyhow::Context;

use super::helpers::parse_email;
use super::subscribe::EmailBody;
use super::{SubscribeError, SubscriptionOutcome, ensure_subscription};
use crate::domain::SubscriptionStatus;
use crate::storage::{Storage, Subscription};

#[derive(serde::Serialize)]
struct DashboardSubscribeResponse {
    success: bool,
    message: &'static str,
    subscription: Subscription,
}

/// Opt-in from a logged in reader. A row left behind without the
/// subscribed status is switched over instead of being reported as done.
#[tracing::instrument(name = "Subscribing from the dashboard", skip(body, storage))]
pub async fn dashboard_subscribe(
    body: web::Json<EmailBody>,
    storage: web::Data<dyn Storage>,
) -> Result<HttpResponse, SubscribeError> {
    let email = parse_email(body.0.email)?;
    let subscribed = SubscriptionStatus::Subscribed;

    let (mut response, message, subscription) =
        match ensure_subscription(storage.get_ref(), &email).await? {
            SubscriptionOutcome::Existing(subscription)
                if subscription.status_subscription.as_deref() == Some(subscribed.as_str()) =>
            {
                (HttpResponse::Ok(), "Usuário já está inscrito", subscription)
            }
            SubscriptionOutcome::Existing(_) => {
                tracing::info!("Existing subscription lacks the subscribed status, updating it");
                let subscription = storage
                    .update_subscription_status(&email, subscribed)
                    .await
                    .context("Failed to update the subscription status.")?;
                (
                    HttpResponse::Ok(),
                    "Sua inscrição foi atualizada com sucesso!",
                    subscription,
                )
            }
            SubscriptionOutcome::Created(subscription) => (
                HttpResponse::Created(),
                "Inscrição realizada com sucesso",
                subscription,
            ),
        };

    Ok(response.json(DashboardSubscribeResponse {
        success: true,
        message,
        subscription,
    }))
}
