use actix_web::{HttpResponse, web};
use anyhow::Context;

use super::SubscribeError;
use super::helpers::parse_email;
use super::subscribe::EmailBody;
use crate::storage::{Storage, Subscription};

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionStatusResponse {
    success: bool,
    is_subscribed: bool,
    has_subscription_status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_field: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_value: Option<String>,
    message: &'static str,
}

#[tracing::instrument(name = "Checking subscription status", skip(body, storage))]
pub async fn check_subscription_status(
    body: web::Json<EmailBody>,
    storage: web::Data<dyn Storage>,
) -> Result<HttpResponse, SubscribeError> {
    let email = parse_email(body.0.email)?;

    let response = match storage
        .find_subscription(&email)
        .await
        .context("Failed to look up the subscription.")?
    {
        Some(subscription) => SubscriptionStatusResponse {
            success: true,
            is_subscribed: true,
            has_subscription_status: true,
            status_field: Some(subscription.status_subscription.is_some()),
            status_value: subscription.status_subscription,
            message: "Usuário inscrito com status confirmado",
        },
        None => SubscriptionStatusResponse {
            success: true,
            is_subscribed: false,
            has_subscription_status: false,
            status_field: None,
            status_value: None,
            message: "Usuário não inscrito",
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

#[derive(serde::Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckSubscriptionResponse {
    is_subscribed: bool,
    subscription: Option<Subscription>,
}

#[tracing::instrument(name = "Checking subscription by query", skip(query, storage))]
pub async fn check_subscription(
    query: web::Query<EmailQuery>,
    storage: web::Data<dyn Storage>,
) -> Result<HttpResponse, SubscribeError> {
    let email = parse_email(query.into_inner().email)?;

    let subscription = storage
        .find_subscription(&email)
        .await
        .context("Failed to look up the subscription.")?;
    Ok(HttpResponse::Ok().json(CheckSubscriptionResponse {
        is_subscribed: subscription.is_some(),
        subscription,
    }))
}
