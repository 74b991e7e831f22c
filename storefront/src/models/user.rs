// storefront/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub email: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub full_name: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub username: String,
  pub email: String,
  pub password_hash: String,
  pub full_name: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
}

/// Replaces the editable profile fields wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
  #[serde(default)]
  pub email: String,
  pub full_name: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
}
