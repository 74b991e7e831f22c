// storefront/src/services/auth_service.rs

//! Password hashing and verification, plus the admin account bootstrap.

use crate::config::AdminBootstrap;
use crate::errors::AppError;
use crate::models::{Admin, ProfileUpdate, User};
use crate::store::Store;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use tracing::{debug, error, info, instrument};

/// Hashes a plain-text password into an Argon2 PHC string.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|argon_err| {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing process failed: {}", argon_err))
    })
}

/// Checks `provided_password` against a stored hash.
///
/// `Ok(false)` means a wrong password; `Err` means the stored hash is unusable.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, AppError> {
  if provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!(
        "Password verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

/// `local@domain.tld` with no whitespace.
pub fn is_valid_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.contains('@')
        && domain
          .split_once('.')
          .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    }
    None => false,
  }
}

/// Creates the configured admin account unless one with that email exists.
#[instrument(name = "auth_service::ensure_admin", skip_all, fields(email = %bootstrap.email), err(Display))]
pub async fn ensure_admin(store: &dyn Store, bootstrap: &AdminBootstrap) -> Result<bool, AppError> {
  if store.find_admin_by_email(&bootstrap.email).await?.is_some() {
    debug!("Admin account already present.");
    return Ok(false);
  }
  let password_hash = hash_password(&bootstrap.password)?;
  store
    .insert_admin(&bootstrap.name, &bootstrap.email, &password_hash)
    .await?;
  info!("Admin account created.");
  Ok(true)
}

/// Checks admin credentials. Unknown emails and wrong passwords fail alike.
#[instrument(name = "auth_service::authenticate_admin", skip(store, password), err(Display))]
pub async fn authenticate_admin(store: &dyn Store, email: &str, password: &str) -> Result<Admin, AppError> {
  let email = email.trim();
  if email.is_empty() || password.is_empty() {
    return Err(AppError::Validation("Email and password are required".to_string()));
  }
  let Some(admin) = store.find_admin_by_email(email).await? else {
    return Err(AppError::Auth("Invalid credentials".to_string()));
  };
  if !verify_password(&admin.password_hash, password)? {
    return Err(AppError::Auth("Invalid credentials".to_string()));
  }
  Ok(admin)
}

pub async fn get_profile(store: &dyn Store, user_id: i64) -> Result<User, AppError> {
  store
    .get_user(user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Replaces a user's editable profile fields. The email must stay unique.
#[instrument(name = "auth_service::update_profile", skip(store, update), err(Display))]
pub async fn update_profile(store: &dyn Store, user_id: i64, update: ProfileUpdate) -> Result<User, AppError> {
  let update = ProfileUpdate {
    email: update.email.trim().to_string(),
    full_name: non_blank(update.full_name),
    phone: non_blank(update.phone),
    address: non_blank(update.address),
  };
  if !is_valid_email(&update.email) {
    return Err(AppError::Validation("Valid email is required".to_string()));
  }
  if store.email_taken_by_other(&update.email, user_id).await? {
    return Err(AppError::Validation("Email already in use".to_string()));
  }
  let user = store
    .update_profile(user_id, &update)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
  info!(user_id, "Profile updated.");
  Ok(user)
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let hash = hash_password("correct horse").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password(&hash, "correct horse").unwrap());
    assert!(!verify_password(&hash, "wrong horse").unwrap());
    assert!(!verify_password(&hash, "").unwrap());
  }

  #[test]
  fn garbage_hash_is_an_internal_error() {
    assert!(matches!(verify_password("not-a-hash", "pw"), Err(AppError::Internal(_))));
  }

  #[test]
  fn email_shape() {
    assert!(is_valid_email("asha@example.com"));
    assert!(!is_valid_email("asha@example"));
    assert!(!is_valid_email("asha example@x.com"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("asha"));
  }
}
