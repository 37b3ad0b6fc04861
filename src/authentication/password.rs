use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use secrecy::{ExposeSecret, SecretString};

use crate::storage::StorageError;
use crate::telemetry::spawn_blocking_with_tracing;

// Verified in place of a real hash when the email is unknown, so both paths
// spend the same time in argon2.
const DUMMY_HASH: &str = "$argon2id$v=19$m=15000,t=2,p=1$\
gZiV/M1gPc22ElAH/Jh1Hw$\
CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

pub fn compute_password_hash(password: SecretString) -> Result<SecretString, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(15000, 2, 1, None).map_err(|e| anyhow::anyhow!(e))?;
    let password_hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to hash password")?
        .to_string();
    Ok(SecretString::from(password_hash))
}

#[tracing::instrument(name = "Verify password hash", skip(expected_password_hash, password_candidate))]
pub fn verify_password_hash(
    expected_password_hash: SecretString,
    password_candidate: SecretString,
) -> Result<(), StorageError> {
    let expected_password_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to parse hash in PHC string format.")?;

    Argon2::default()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_password_hash,
        )
        .map_err(|e| anyhow::anyhow!(e))
        .context("Invalid password.")
        .map_err(StorageError::InvalidCredentials)
}

pub async fn hash_password(password: SecretString) -> Result<SecretString, anyhow::Error> {
    spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("Failed to spawn blocking task.")?
}

/// Checks `candidate` against the stored hash of an account, or against a
/// dummy hash when no account matched. Unknown accounts always fail.
#[tracing::instrument(name = "Validate password", skip(stored_hash, candidate))]
pub async fn validate_password(
    stored_hash: Option<SecretString>,
    candidate: SecretString,
) -> Result<(), StorageError> {
    let account_exists = stored_hash.is_some();
    let expected = stored_hash.unwrap_or_else(|| SecretString::from(DUMMY_HASH));

    let outcome = spawn_blocking_with_tracing(move || verify_password_hash(expected, candidate))
        .await
        .context("Failed to spawn blocking task.")?;

    if !account_exists {
        return Err(StorageError::InvalidCredentials(anyhow::anyhow!(
            "Unknown email."
        )));
    }
    outcome
}
