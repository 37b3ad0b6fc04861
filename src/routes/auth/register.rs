use actix_web::{HttpResponse, web};
use anyhow::Context;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use super::AuthError;
use crate::domain::{AccountStatus, NewAccount};
use crate::routes::non_blank;
use crate::session_state::TypedSession;
use crate::storage::{AccountUser, Credentials, Identity, Storage, StorageError};

#[derive(serde::Deserialize)]
pub struct RegisterBody {
    pub email: Option<String>,
    pub password: Option<SecretString>,
    pub name: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    message: &'static str,
    user_id: Uuid,
    email: String,
    name: String,
    account_user: AccountUser,
}

#[tracing::instrument(
    name = "Registering a new account",
    skip(body, storage, session),
    fields(email = tracing::field::Empty, user_id = tracing::field::Empty)
)]
pub async fn register(
    body: web::Json<RegisterBody>,
    storage: web::Data<dyn Storage>,
    session: TypedSession,
) -> Result<HttpResponse, AuthError> {
    let RegisterBody {
        email,
        password,
        name,
    } = body.into_inner();
    let password = password.filter(|p| !p.expose_secret().is_empty());
    let (Some(email), Some(password), Some(name)) = (non_blank(email), password, non_blank(name))
    else {
        return Err(AuthError::ValidationError(
            "Email, senha e nome são obrigatórios".into(),
        ));
    };
    let new_account = NewAccount::parse(email, name, password)
        .map_err(|e| AuthError::ValidationError(format!("Dados de cadastro inválidos: {e}")))?;
    tracing::Span::current().record("email", tracing::field::display(&new_account.email));

    let identity = match storage.create_identity(&new_account).await {
        Ok(identity) => identity,
        Err(StorageError::Conflict(e)) => {
            unfinished_identity(storage.get_ref(), &new_account)
                .await
                .context("Failed to check the existing registration.")?
                .ok_or(AuthError::AlreadyRegistered(e))?
        }
        Err(e) => {
            return Err(AuthError::UnexpectedError(
                anyhow::Error::from(e).context("Failed to create the auth identity."),
            ));
        }
    };
    tracing::Span::current().record("user_id", tracing::field::display(&identity.id));

    let account = store_profile(storage.get_ref(), &identity, &new_account)
        .await
        .context("Failed to store the account profile.")?;

    session.renew();
    session
        .insert_user_id(identity.id)
        .context("Failed to start a session for the new account.")?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "Usuário criado com sucesso",
        user_id: identity.id,
        email: identity.email,
        name: account.name.clone(),
        account_user: account,
    }))
}

/// An identity whose profile was never stored, e.g. because the first
/// attempt failed halfway. The caller proves ownership with the password.
#[tracing::instrument(name = "Looking for an unfinished registration", skip_all)]
async fn unfinished_identity(
    storage: &dyn Storage,
    new_account: &NewAccount,
) -> Result<Option<Identity>, StorageError> {
    let credentials = Credentials {
        email: new_account.email.to_string(),
        password: new_account.password.secret().clone(),
    };
    let identity = match storage.authenticate(credentials).await {
        Ok(auth) => auth.identity,
        Err(StorageError::InvalidCredentials(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    if storage.find_account_by_user_id(identity.id).await?.is_some() {
        return Ok(None);
    }
    tracing::warn!(user_id = %identity.id, "Resuming a registration without profile");
    Ok(Some(identity))
}

/// Points the `account_user` row for this email at the new identity,
/// creating the row when the visitor never had one.
#[tracing::instrument(name = "Storing account profile", skip_all)]
async fn store_profile(
    storage: &dyn Storage,
    identity: &Identity,
    new_account: &NewAccount,
) -> Result<AccountUser, StorageError> {
    let profile = AccountUser {
        id: identity.id,
        user_id: Some(identity.id),
        name: new_account.name.as_ref().to_string(),
        email: new_account.email.to_string(),
        status: AccountStatus::Active.as_str().to_string(),
        created_at: Utc::now(),
    };

    if storage
        .find_account_by_email(&new_account.email)
        .await?
        .is_some()
    {
        return storage.update_account(&new_account.email, &profile).await;
    }
    match storage.insert_account(&profile).await {
        Err(StorageError::Conflict(_)) => {
            storage.update_account(&new_account.email, &profile).await
        }
        other => other,
    }
}
