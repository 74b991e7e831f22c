// storefront/src/models/admin.rs

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Admin {
  pub id: i64,
  pub name: String,
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
}
