use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub email_subscription: String,
    pub created_at: DateTime<Utc>,
    pub status_subscription: Option<String>,
}

/// Profile row keyed by the auth identity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountUser {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Carta {
    pub id: i64,
    pub id_sumary_carta: i32,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub carta_id: i64,
    pub account_user_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Tokens handed out by an external auth provider. Local backends keep the
/// login state in the cookie session only and return none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub identity: Identity,
    pub tokens: Option<SessionTokens>,
}

pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}
