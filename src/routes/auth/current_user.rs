use actix_web::{HttpResponse, web};
use anyhow::Context;

use super::AuthError;
use crate::authentication::UserId;
use crate::storage::Storage;

#[tracing::instrument(name = "Fetching the current user", skip_all, fields(user_id = %**user_id))]
pub async fn current_user(
    user_id: web::ReqData<UserId>,
    storage: web::Data<dyn Storage>,
) -> Result<HttpResponse, AuthError> {
    let profile = storage
        .find_account_by_user_id(**user_id)
        .await
        .context("Failed to load the account profile.")?
        .ok_or(AuthError::ProfileNotFound)?;
    Ok(HttpResponse::Ok().json(profile))
}
