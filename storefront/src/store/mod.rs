// storefront/src/store/mod.rs

//! Persistence seam: `Store` for single statements and `StoreTx` for the
//! atomic scopes of order placement and payment verification.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::models::{
  Admin, CartLine, NewOrder, NewPayment, NewProduct, NewUser, Order, OrderItem, OrderStatus, Payment, Product,
  ProfileUpdate, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Product {product_id} not found")]
  ProductNotFound { product_id: i64 },

  #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: i64,
    requested: i32,
    available: i32,
  },

  #[error("Referenced {entity} {id} does not exist")]
  MissingReference { entity: &'static str, id: i64 },

  #[error("{entity} {id} is still referenced by existing orders")]
  StillReferenced { entity: &'static str, id: i64 },

  #[error("{0}")]
  Conflict(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Transaction is not open")]
  TransactionClosed,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One row of the order listing join: an order, and one of its lines if it has any.
#[derive(Debug, Clone, FromRow)]
pub struct OrderLineRow {
  pub id: i64,
  pub user_id: i64,
  pub total_amount: Decimal,
  pub shipping_address: Option<String>,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub line_id: Option<i64>,
  pub product_id: Option<i64>,
  pub quantity: Option<i32>,
  pub price: Option<Decimal>,
  pub product_name: Option<String>,
}

#[async_trait]
pub trait Store: Send + Sync {
  /// Opens an atomic scope. Dropping the handle without `commit` discards its writes.
  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

  async fn list_products(&self) -> StoreResult<Vec<Product>>;
  async fn find_products(&self, ids: &[i64]) -> StoreResult<Vec<Product>>;
  async fn get_product(&self, id: i64) -> StoreResult<Option<Product>>;
  async fn insert_product(&self, product: &NewProduct) -> StoreResult<Product>;
  /// Writes every mutable column of `product`; `None` when the row is gone.
  async fn save_product(&self, product: &Product) -> StoreResult<Option<Product>>;
  async fn delete_product(&self, id: i64) -> StoreResult<bool>;

  /// Orders joined with their lines, newest order first, lines in insertion order.
  async fn order_rows(&self, user_id: Option<i64>) -> StoreResult<Vec<OrderLineRow>>;
  async fn get_order(&self, id: i64) -> StoreResult<Option<Order>>;
  async fn order_items(&self, order_id: i64) -> StoreResult<Vec<OrderItem>>;
  async fn update_order_status(&self, id: i64, status: OrderStatus) -> StoreResult<bool>;

  async fn insert_payment(&self, payment: &NewPayment) -> StoreResult<Payment>;
  async fn find_payment(&self, provider_order_id: &str) -> StoreResult<Option<Payment>>;

  async fn user_exists(&self, username: &str, email: &str) -> StoreResult<bool>;
  /// Matches either the username or the email.
  async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>>;
  async fn get_user(&self, id: i64) -> StoreResult<Option<User>>;
  async fn insert_user(&self, user: &NewUser) -> StoreResult<User>;
  async fn email_taken_by_other(&self, email: &str, user_id: i64) -> StoreResult<bool>;
  async fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> StoreResult<Option<User>>;

  async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<Admin>>;
  async fn insert_admin(&self, name: &str, email: &str, password_hash: &str) -> StoreResult<Admin>;
}

#[async_trait]
pub trait StoreTx: Send {
  async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order>;
  async fn insert_order_item(&mut self, order_id: i64, line: &CartLine) -> StoreResult<OrderItem>;
  /// Takes `quantity` units only if that many are in stock; returns what is left.
  async fn decrement_stock(&mut self, product_id: i64, quantity: i32) -> StoreResult<i32>;

  /// The record for a gateway order, locked until the scope ends.
  async fn lock_payment(&mut self, provider_order_id: &str) -> StoreResult<Option<Payment>>;
  async fn insert_payment(&mut self, payment: &NewPayment) -> StoreResult<Payment>;
  async fn mark_payment_success(
    &mut self,
    payment_id: i64,
    provider_payment_id: &str,
    signature: &str,
  ) -> StoreResult<Payment>;
  /// Moves a `pending` order to `confirmed`; false when it was in any other state.
  async fn confirm_order(&mut self, order_id: i64) -> StoreResult<bool>;

  async fn commit(self: Box<Self>) -> StoreResult<()>;
  async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Shared home of a pipeline's open transaction.
///
/// Steps lock the slot for the duration of one store call; `commit` and
/// `rollback` take the transaction out, so it ends exactly once.
#[derive(Clone, Default)]
pub struct TxSlot(Arc<Mutex<Option<Box<dyn StoreTx>>>>);

impl TxSlot {
  pub async fn open(&self, store: &dyn Store) -> StoreResult<()> {
    let tx = store.begin().await?;
    let previous = self.0.lock().await.replace(tx);
    if let Some(stale) = previous {
      tracing::warn!("Replacing a transaction that was never closed; rolling it back.");
      stale.rollback().await?;
    }
    Ok(())
  }

  pub async fn lock(&self) -> MutexGuard<'_, Option<Box<dyn StoreTx>>> {
    self.0.lock().await
  }

  pub async fn commit(&self) -> StoreResult<()> {
    let tx = self.0.lock().await.take().ok_or(StoreError::TransactionClosed)?;
    tx.commit().await
  }

  /// Rolls back if a transaction is still open; returns whether one was.
  pub async fn rollback(&self) -> StoreResult<bool> {
    let open = self.0.lock().await.take();
    match open {
      Some(tx) => {
        tx.rollback().await?;
        Ok(true)
      }
      None => Ok(false),
    }
  }
}

impl std::fmt::Debug for TxSlot {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TxSlot").finish_non_exhaustive()
  }
}
