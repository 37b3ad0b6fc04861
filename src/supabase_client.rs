use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::storage::SessionTokens;

const UNIQUE_VIOLATION: &str = "23505";

/// Thin client over the PostgREST (`/rest/v1`) and GoTrue (`/auth/v1`)
/// endpoints of a Supabase project.
#[derive(Clone, Debug)]
pub struct SupabaseClient {
    http_client: Client,
    base_url: Url,
    anon_key: SecretString,
    privileged_key: SecretString,
}

#[derive(thiserror::Error, Debug)]
pub enum SupabaseError {
    #[error("Failed to reach Supabase.")]
    Transport(#[from] reqwest::Error),
    #[error("Supabase responded with {status}: {message}")]
    Api {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl SupabaseError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            SupabaseError::Api { code, .. } => code.as_deref() == Some(UNIQUE_VIOLATION),
            _ => false,
        }
    }

    pub fn is_already_registered(&self) -> bool {
        match self {
            SupabaseError::Api {
                status,
                code,
                message,
            } => {
                code.as_deref() == Some("email_exists")
                    || code.as_deref() == Some("user_already_exists")
                    || (*status == StatusCode::UNPROCESSABLE_ENTITY
                        && message.to_lowercase().contains("already"))
            }
            _ => false,
        }
    }

    pub fn is_invalid_credentials(&self) -> bool {
        match self {
            SupabaseError::Api { code, message, .. } => match code.as_deref() {
                Some("invalid_credentials") => true,
                // Older GoTrue releases answer every rejected grant with
                // `invalid_grant`, only the description tells them apart.
                Some("invalid_grant") => message
                    .to_lowercase()
                    .contains("invalid login credentials"),
                _ => false,
            },
            _ => false,
        }
    }
}

/// Error payloads differ between PostgREST (`code`/`message`) and GoTrue
/// (`error_code`/`msg` or `error`/`error_description`).
#[derive(Deserialize, Default)]
struct ApiErrorBody {
    code: Option<serde_json::Value>,
    error_code: Option<String>,
    error: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

impl ApiErrorBody {
    fn into_error(self, status: StatusCode) -> SupabaseError {
        let code = self
            .error_code
            .or_else(|| match self.code {
                Some(serde_json::Value::String(code)) => Some(code),
                _ => None,
            })
            .or(self.error);
        let message = self
            .message
            .or(self.msg)
            .or(self.error_description)
            .unwrap_or_else(|| status.to_string());
        SupabaseError::Api {
            status,
            code,
            message,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: uuid::Uuid,
    pub email: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: AuthUser,
}

impl PasswordGrant {
    pub fn tokens(&self) -> SessionTokens {
        SessionTokens {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_type: self.token_type.clone(),
            expires_in: self.expires_in,
        }
    }
}

#[derive(Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct UserMetadata<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct CreateUserRequest<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
    user_metadata: UserMetadata<'a>,
}

impl SupabaseClient {
    pub fn new(
        base_url: Url,
        anon_key: SecretString,
        privileged_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the Supabase HTTP client.")?;
        Ok(Self {
            http_client,
            base_url,
            anon_key,
            privileged_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        self.base_url
            .join(path)
            .with_context(|| format!("Failed joining {path} to the Supabase url."))
            .map_err(SupabaseError::Unexpected)
    }

    fn authorized(&self, request: RequestBuilder, key: &SecretString) -> RequestBuilder {
        request
            .header("apikey", key.expose_secret())
            .bearer_auth(key.expose_secret())
    }

    fn table(&self, table: &str) -> Result<Url, SupabaseError> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    #[tracing::instrument(name = "Supabase select", skip(self))]
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, SupabaseError> {
        let request = self
            .http_client
            .get(self.table(table)?)
            .query(&[("select", "*")])
            .query(filters);
        let response = self.authorized(request, &self.privileged_key).send().await?;
        Ok(error_for_status(response).await?.json().await?)
    }

    #[tracing::instrument(name = "Supabase insert", skip(self, body))]
    pub async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, SupabaseError> {
        let request = self
            .http_client
            .post(self.table(table)?)
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.authorized(request, &self.privileged_key).send().await?;
        let mut rows: Vec<T> = error_for_status(response).await?.json().await?;
        if rows.is_empty() {
            return Err(anyhow::anyhow!("Supabase returned no row for an insert into {table}").into());
        }
        Ok(rows.swap_remove(0))
    }

    /// Insert without asking for the representation back.
    #[tracing::instrument(name = "Supabase insert (minimal)", skip(self, body))]
    pub async fn insert_minimal<B: Serialize>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<(), SupabaseError> {
        let request = self
            .http_client
            .post(self.table(table)?)
            .header("Prefer", "return=minimal")
            .json(body);
        let response = self.authorized(request, &self.privileged_key).send().await?;
        error_for_status(response).await?;
        Ok(())
    }

    #[tracing::instrument(name = "Supabase update", skip(self, body))]
    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> Result<Vec<T>, SupabaseError> {
        let request = self
            .http_client
            .patch(self.table(table)?)
            .query(filters)
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.authorized(request, &self.privileged_key).send().await?;
        Ok(error_for_status(response).await?.json().await?)
    }

    #[tracing::instrument(name = "Supabase count", skip(self))]
    pub async fn count(&self, table: &str) -> Result<u64, SupabaseError> {
        let request = self
            .http_client
            .head(self.table(table)?)
            .query(&[("select", "*")])
            .header("Prefer", "count=exact");
        let response = self.authorized(request, &self.privileged_key).send().await?;
        let response = error_for_status(response).await?;
        let content_range = response
            .headers()
            .get("content-range")
            .context("Supabase count response is missing the Content-Range header.")?
            .to_str()
            .context("The Content-Range header was not a valid UTF8 string.")?;
        parse_content_range_total(content_range)
            .with_context(|| format!("Unexpected Content-Range header: {content_range}"))
            .map_err(SupabaseError::Unexpected)
    }

    #[tracing::instrument(name = "Supabase password sign in", skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<PasswordGrant, SupabaseError> {
        let request = self
            .http_client
            .post(self.endpoint("auth/v1/token")?)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrantRequest {
                email,
                password: password.expose_secret(),
            });
        let response = self.authorized(request, &self.anon_key).send().await?;
        Ok(error_for_status(response).await?.json().await?)
    }

    #[tracing::instrument(name = "Supabase admin create user", skip(self, password))]
    pub async fn admin_create_user(
        &self,
        email: &str,
        password: &SecretString,
        name: &str,
    ) -> Result<AuthUser, SupabaseError> {
        let request = self
            .http_client
            .post(self.endpoint("auth/v1/admin/users")?)
            .json(&CreateUserRequest {
                email,
                password: password.expose_secret(),
                email_confirm: true,
                user_metadata: UserMetadata { name },
            });
        let response = self.authorized(request, &self.privileged_key).send().await?;
        Ok(error_for_status(response).await?.json().await?)
    }
}

async fn error_for_status(response: Response) -> Result<Response, SupabaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let error_body: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
    Err(error_body.into_error(status))
}

/// Extracts the total from `Content-Range` values such as `0-24/57` or `*/57`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}
