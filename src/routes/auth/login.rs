use actix_web::{HttpResponse, web};
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};

use super::AuthError;
use crate::domain::SubscriberEmail;
use crate::routes::non_blank;
use crate::session_state::TypedSession;
use crate::storage::{AccountUser, Credentials, Identity, SessionTokens, Storage, StorageError};

#[derive(serde::Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<SecretString>,
}

#[derive(serde::Serialize)]
#[serde(untagged)]
enum LoggedInUser {
    Profile(AccountUser),
    Identity(Identity),
}

#[derive(serde::Serialize)]
struct LoginResponse {
    message: &'static str,
    user: LoggedInUser,
    session: Option<SessionTokens>,
}

#[tracing::instrument(
    name = "Logging in",
    skip(body, storage, session),
    fields(email = tracing::field::Empty, user_id = tracing::field::Empty)
)]
pub async fn login(
    body: web::Json<LoginBody>,
    storage: web::Data<dyn Storage>,
    session: TypedSession,
) -> Result<HttpResponse, AuthError> {
    let LoginBody { email, password } = body.into_inner();
    let password = password.filter(|p| !p.expose_secret().is_empty());
    let (Some(email), Some(password)) = (non_blank(email), password) else {
        return Err(AuthError::ValidationError(
            "Email e senha são obrigatórios".into(),
        ));
    };
    let email = email.trim().to_lowercase();
    tracing::Span::current().record("email", tracing::field::display(&email));

    let auth = storage
        .authenticate(Credentials { email, password })
        .await
        .map_err(|e| match e {
            StorageError::InvalidCredentials(e) => AuthError::InvalidCredentials(e),
            e => AuthError::UnexpectedError(
                anyhow::Error::from(e).context("Failed to authenticate the credentials."),
            ),
        })?;
    tracing::Span::current().record("user_id", tracing::field::display(&auth.identity.id));

    let user = match find_profile(storage.get_ref(), &auth.identity)
        .await
        .context("Failed to load the account profile.")?
    {
        Some(profile) => LoggedInUser::Profile(profile),
        None => {
            tracing::warn!("Logged in user has no account profile");
            LoggedInUser::Identity(auth.identity.clone())
        }
    };

    session.renew();
    session
        .insert_user_id(auth.identity.id)
        .context("Failed to start a session.")?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login realizado com sucesso",
        user,
        session: auth.tokens,
    }))
}

/// Profiles created before the identity existed are only linked by email.
async fn find_profile(
    storage: &dyn Storage,
    identity: &Identity,
) -> Result<Option<AccountUser>, StorageError> {
    if let Some(profile) = storage.find_account_by_user_id(identity.id).await? {
        return Ok(Some(profile));
    }
    match SubscriberEmail::parse(identity.email.clone()) {
        Ok(email) => storage.find_account_by_email(&email).await,
        Err(_) => Ok(None),
    }
}
