// storefront/src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};

use super::{OrderLineRow, Store, StoreError, StoreResult, StoreTx};
use crate::models::{
  Admin, CartLine, NewOrder, NewPayment, NewProduct, NewUser, Order, OrderItem, OrderStatus, Payment, Product,
  ProfileUpdate, User,
};

const PRODUCT_COLUMNS: &str =
  "id, name, description, price, discount_price, stock_quantity, category, image, created_at";
const ORDER_COLUMNS: &str = "id, user_id, total_amount, shipping_address, status, created_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price";
const PAYMENT_COLUMNS: &str = "id, order_id, provider_order_id, provider_payment_id, signature, amount, currency, \
                               status, created_at, verified_at";
const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, phone, address, created_at";
const ADMIN_COLUMNS: &str = "id, name, email, password_hash";

/// `Store` over a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

async fn insert_payment_on(conn: &mut PgConnection, payment: &NewPayment) -> StoreResult<Payment> {
  let sql = format!(
    "INSERT INTO payments (order_id, provider_order_id, provider_payment_id, signature, amount, currency, status, verified_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $7 = 'success'::payment_status THEN NOW() END) \
     RETURNING {}",
    PAYMENT_COLUMNS
  );
  sqlx::query_as::<_, Payment>(&sql)
    .bind(payment.order_id)
    .bind(&payment.provider_order_id)
    .bind(&payment.provider_payment_id)
    .bind(&payment.signature)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.status)
    .fetch_one(conn)
    .await
    .map_err(|e| {
      if is_unique_violation(&e) {
        StoreError::Conflict(format!(
          "A payment record for gateway order {} already exists",
          payment.provider_order_id
        ))
      } else if is_foreign_key_violation(&e) {
        StoreError::MissingReference {
          entity: "order",
          id: payment.order_id.unwrap_or_default(),
        }
      } else {
        StoreError::Database(e)
      }
    })
}

#[async_trait]
impl Store for PgStore {
  #[instrument(name = "PgStore::begin", skip(self), err(Display))]
  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
    let tx = self.pool.begin().await?;
    debug!("Transaction opened.");
    Ok(Box::new(PgTx { tx }))
  }

  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    let sql = format!("SELECT {} FROM products ORDER BY created_at DESC, id DESC", PRODUCT_COLUMNS);
    Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?)
  }

  async fn find_products(&self, ids: &[i64]) -> StoreResult<Vec<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = ANY($1) ORDER BY id", PRODUCT_COLUMNS);
    Ok(sqlx::query_as::<_, Product>(&sql).bind(ids).fetch_all(&self.pool).await?)
  }

  async fn get_product(&self, id: i64) -> StoreResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn insert_product(&self, product: &NewProduct) -> StoreResult<Product> {
    let sql = format!(
      "INSERT INTO products (name, description, price, discount_price, stock_quantity, category, image) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      PRODUCT_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Product>(&sql)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.stock_quantity)
        .bind(&product.category)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn save_product(&self, product: &Product) -> StoreResult<Option<Product>> {
    let sql = format!(
      "UPDATE products SET name = $1, description = $2, price = $3, discount_price = $4, stock_quantity = $5, \
       category = $6, image = $7 WHERE id = $8 RETURNING {}",
      PRODUCT_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Product>(&sql)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.stock_quantity)
        .bind(&product.category)
        .bind(&product.image)
        .bind(product.id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn delete_product(&self, id: i64) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(|e| {
        if is_foreign_key_violation(&e) {
          StoreError::StillReferenced { entity: "product", id }
        } else {
          StoreError::Database(e)
        }
      })?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "PgStore::order_rows", skip(self), err(Display))]
  async fn order_rows(&self, user_id: Option<i64>) -> StoreResult<Vec<OrderLineRow>> {
    let rows = sqlx::query_as::<_, OrderLineRow>(
      "SELECT o.id, o.user_id, o.total_amount, o.shipping_address, o.status, o.created_at, \
              oi.id AS line_id, oi.product_id, oi.quantity, oi.price, p.name AS product_name \
       FROM orders o \
       LEFT JOIN order_items oi ON oi.order_id = o.id \
       LEFT JOIN products p ON p.id = oi.product_id \
       WHERE ($1::BIGINT IS NULL OR o.user_id = $1) \
       ORDER BY o.created_at DESC, o.id DESC, oi.id ASC",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    debug!(rows = rows.len(), "Fetched order rows.");
    Ok(rows)
  }

  async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, Order>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn order_items(&self, order_id: i64) -> StoreResult<Vec<OrderItem>> {
    let sql = format!("SELECT {} FROM order_items WHERE order_id = $1 ORDER BY id", ORDER_ITEM_COLUMNS);
    Ok(sqlx::query_as::<_, OrderItem>(&sql).bind(order_id).fetch_all(&self.pool).await?)
  }

  async fn update_order_status(&self, id: i64, status: OrderStatus) -> StoreResult<bool> {
    let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
      .bind(status)
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn insert_payment(&self, payment: &NewPayment) -> StoreResult<Payment> {
    let mut conn = self.pool.acquire().await?;
    insert_payment_on(&mut conn, payment).await
  }

  async fn find_payment(&self, provider_order_id: &str) -> StoreResult<Option<Payment>> {
    let sql = format!("SELECT {} FROM payments WHERE provider_order_id = $1", PAYMENT_COLUMNS);
    Ok(
      sqlx::query_as::<_, Payment>(&sql)
        .bind(provider_order_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn user_exists(&self, username: &str, email: &str) -> StoreResult<bool> {
    Ok(
      sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)")
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
    let sql = format!(
      "SELECT {} FROM users WHERE username = $1 OR email = $1 ORDER BY id LIMIT 1",
      USER_COLUMNS
    );
    Ok(sqlx::query_as::<_, User>(&sql).bind(login).fetch_optional(&self.pool).await?)
  }

  async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn insert_user(&self, user: &NewUser) -> StoreResult<User> {
    let sql = format!(
      "INSERT INTO users (username, email, password_hash, full_name, phone, address) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
      USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&sql)
      .bind(&user.username)
      .bind(&user.email)
      .bind(&user.password_hash)
      .bind(&user.full_name)
      .bind(&user.phone)
      .bind(&user.address)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| {
        if is_unique_violation(&e) {
          StoreError::Conflict("Username or email already exists".to_string())
        } else {
          StoreError::Database(e)
        }
      })
  }

  async fn email_taken_by_other(&self, email: &str, user_id: i64) -> StoreResult<bool> {
    Ok(
      sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)")
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> StoreResult<Option<User>> {
    let sql = format!(
      "UPDATE users SET full_name = $1, phone = $2, address = $3, email = $4 WHERE id = $5 RETURNING {}",
      USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&sql)
      .bind(&update.full_name)
      .bind(&update.phone)
      .bind(&update.address)
      .bind(&update.email)
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| {
        if is_unique_violation(&e) {
          StoreError::Conflict("Email already in use".to_string())
        } else {
          StoreError::Database(e)
        }
      })
  }

  async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
    let sql = format!("SELECT {} FROM admins WHERE email = $1", ADMIN_COLUMNS);
    Ok(sqlx::query_as::<_, Admin>(&sql).bind(email).fetch_optional(&self.pool).await?)
  }

  async fn insert_admin(&self, name: &str, email: &str, password_hash: &str) -> StoreResult<Admin> {
    let sql = format!(
      "INSERT INTO admins (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
      ADMIN_COLUMNS
    );
    sqlx::query_as::<_, Admin>(&sql)
      .bind(name)
      .bind(email)
      .bind(password_hash)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| {
        if is_unique_violation(&e) {
          StoreError::Conflict(format!("Admin {} already exists", email))
        } else {
          StoreError::Database(e)
        }
      })
  }
}

/// A leased connection inside `BEGIN`. sqlx rolls back on drop if neither
/// `commit` nor `rollback` ran.
pub struct PgTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
  async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order> {
    let sql = format!(
      "INSERT INTO orders (user_id, total_amount, shipping_address, status) \
       VALUES ($1, $2, $3, 'pending') RETURNING {}",
      ORDER_COLUMNS
    );
    sqlx::query_as::<_, Order>(&sql)
      .bind(order.user_id)
      .bind(order.total_amount)
      .bind(&order.shipping_address)
      .fetch_one(&mut *self.tx)
      .await
      .map_err(|e| {
        if is_foreign_key_violation(&e) {
          StoreError::MissingReference {
            entity: "user",
            id: order.user_id,
          }
        } else {
          StoreError::Database(e)
        }
      })
  }

  async fn insert_order_item(&mut self, order_id: i64, line: &CartLine) -> StoreResult<OrderItem> {
    let sql = format!(
      "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4) RETURNING {}",
      ORDER_ITEM_COLUMNS
    );
    sqlx::query_as::<_, OrderItem>(&sql)
      .bind(order_id)
      .bind(line.product_id)
      .bind(line.quantity)
      .bind(line.price)
      .fetch_one(&mut *self.tx)
      .await
      .map_err(|e| {
        if is_foreign_key_violation(&e) {
          StoreError::ProductNotFound {
            product_id: line.product_id,
          }
        } else {
          StoreError::Database(e)
        }
      })
  }

  async fn decrement_stock(&mut self, product_id: i64, quantity: i32) -> StoreResult<i32> {
    let remaining = sqlx::query_scalar::<_, i32>(
      "UPDATE products SET stock_quantity = stock_quantity - $1 \
       WHERE id = $2 AND stock_quantity >= $1 RETURNING stock_quantity",
    )
    .bind(quantity)
    .bind(product_id)
    .fetch_optional(&mut *self.tx)
    .await?;

    if let Some(remaining) = remaining {
      return Ok(remaining);
    }

    let available = sqlx::query_scalar::<_, i32>("SELECT stock_quantity FROM products WHERE id = $1")
      .bind(product_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    match available {
      Some(available) => {
        warn!(product_id, requested = quantity, available, "Conditional stock decrement refused.");
        Err(StoreError::InsufficientStock {
          product_id,
          requested: quantity,
          available,
        })
      }
      None => Err(StoreError::ProductNotFound { product_id }),
    }
  }

  async fn lock_payment(&mut self, provider_order_id: &str) -> StoreResult<Option<Payment>> {
    let sql = format!(
      "SELECT {} FROM payments WHERE provider_order_id = $1 FOR UPDATE",
      PAYMENT_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Payment>(&sql)
        .bind(provider_order_id)
        .fetch_optional(&mut *self.tx)
        .await?,
    )
  }

  async fn insert_payment(&mut self, payment: &NewPayment) -> StoreResult<Payment> {
    insert_payment_on(&mut self.tx, payment).await
  }

  async fn mark_payment_success(
    &mut self,
    payment_id: i64,
    provider_payment_id: &str,
    signature: &str,
  ) -> StoreResult<Payment> {
    let sql = format!(
      "UPDATE payments SET status = 'success', provider_payment_id = $2, signature = $3, verified_at = NOW() \
       WHERE id = $1 RETURNING {}",
      PAYMENT_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Payment>(&sql)
        .bind(payment_id)
        .bind(provider_payment_id)
        .bind(signature)
        .fetch_one(&mut *self.tx)
        .await?,
    )
  }

  async fn confirm_order(&mut self, order_id: i64) -> StoreResult<bool> {
    let result = sqlx::query("UPDATE orders SET status = 'confirmed' WHERE id = $1 AND status = 'pending'")
      .bind(order_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.tx.commit().await?;
    debug!("Transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    self.tx.rollback().await?;
    debug!("Transaction rolled back.");
    Ok(())
  }
}
