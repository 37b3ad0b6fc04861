use actix_web::{HttpResponse, web};
use anyhow::Context;

use super::SubscribeError;
use super::helpers::{SubscriptionOutcome, ensure_subscription, parse_email};
use crate::storage::{Storage, Subscription};

#[derive(serde::Deserialize)]
pub struct EmailBody {
    pub email: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscribeResponse {
    success: bool,
    message: &'static str,
    email: String,
    user_exists: bool,
    subscription_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscription: Option<Subscription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'static str>,
}

/// Newsletter opt-in from the landing page. Reconciles the address against
/// both the auth identities and the subscriptions, and sends visitors
/// without an account towards registration.
#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(body, storage),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    body: web::Json<EmailBody>,
    storage: web::Data<dyn Storage>,
) -> Result<HttpResponse, SubscribeError> {
    let email = parse_email(body.0.email)?;
    tracing::Span::current().record("subscriber_email", tracing::field::display(&email));

    let user_exists = storage
        .find_identity_by_email(&email)
        .await
        .context("Failed to look up the account for this email.")?
        .is_some();
    let outcome = ensure_subscription(storage.get_ref(), &email).await?;

    let subscription_exists = matches!(outcome, SubscriptionOutcome::Existing(_));
    let (message, subscription) = match (user_exists, outcome) {
        (true, SubscriptionOutcome::Existing(_)) => {
            ("Você já está inscrito e possui uma conta", None)
        }
        (true, SubscriptionOutcome::Created(_)) => ("Inscrição realizada com sucesso", None),
        (false, SubscriptionOutcome::Existing(_)) => (
            "Você já está inscrito. Crie sua conta para acessar as cartas",
            None,
        ),
        (false, SubscriptionOutcome::Created(subscription)) => (
            "Inscrição realizada com sucesso. Crie sua conta para acessar as cartas",
            Some(subscription),
        ),
    };

    let mut response = if subscription.is_some() {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };
    Ok(response.json(SubscribeResponse {
        success: true,
        message,
        email: email.to_string(),
        user_exists,
        subscription_exists,
        subscription,
        redirect: (!user_exists).then_some("register"),
    }))
}
