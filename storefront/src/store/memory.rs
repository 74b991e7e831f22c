// storefront/src/store/memory.rs

//! In-process `Store` for tests and local runs without a database.
//!
//! A transaction holds the table lock for its whole life and works on a
//! copy of the tables, swapped in on commit. Transactions are therefore
//! serialized, and an uncommitted scope leaves no trace.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{OrderLineRow, Store, StoreError, StoreResult, StoreTx};
use crate::models::{
  Admin, CartLine, NewOrder, NewPayment, NewProduct, NewUser, Order, OrderItem, OrderStatus, Payment, PaymentStatus,
  Product, ProfileUpdate, User,
};

#[derive(Debug, Clone, Default)]
struct Tables {
  products: BTreeMap<i64, Product>,
  orders: BTreeMap<i64, Order>,
  order_items: BTreeMap<i64, OrderItem>,
  payments: BTreeMap<i64, Payment>,
  users: BTreeMap<i64, User>,
  admins: BTreeMap<i64, Admin>,
  last_id: i64,
}

impl Tables {
  /// One sequence shared by every table; ids only need to be unique per table.
  fn next_id(&mut self) -> i64 {
    self.last_id += 1;
    self.last_id
  }

  fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order> {
    if !self.users.contains_key(&order.user_id) {
      return Err(StoreError::MissingReference {
        entity: "user",
        id: order.user_id,
      });
    }
    let row = Order {
      id: self.next_id(),
      user_id: order.user_id,
      total_amount: order.total_amount,
      shipping_address: order.shipping_address.clone(),
      status: OrderStatus::Pending,
      created_at: Utc::now(),
    };
    self.orders.insert(row.id, row.clone());
    Ok(row)
  }

  fn insert_order_item(&mut self, order_id: i64, line: &CartLine) -> StoreResult<OrderItem> {
    if !self.orders.contains_key(&order_id) {
      return Err(StoreError::MissingReference {
        entity: "order",
        id: order_id,
      });
    }
    if !self.products.contains_key(&line.product_id) {
      return Err(StoreError::ProductNotFound {
        product_id: line.product_id,
      });
    }
    let row = OrderItem {
      id: self.next_id(),
      order_id,
      product_id: line.product_id,
      quantity: line.quantity,
      price: line.price,
    };
    self.order_items.insert(row.id, row.clone());
    Ok(row)
  }

  fn decrement_stock(&mut self, product_id: i64, quantity: i32) -> StoreResult<i32> {
    let product = self
      .products
      .get_mut(&product_id)
      .ok_or(StoreError::ProductNotFound { product_id })?;
    if product.stock_quantity < quantity {
      return Err(StoreError::InsufficientStock {
        product_id,
        requested: quantity,
        available: product.stock_quantity,
      });
    }
    product.stock_quantity -= quantity;
    Ok(product.stock_quantity)
  }

  fn payment_by_provider_order(&self, provider_order_id: &str) -> Option<&Payment> {
    self
      .payments
      .values()
      .find(|p| p.provider_order_id == provider_order_id)
  }

  fn insert_payment(&mut self, payment: &NewPayment) -> StoreResult<Payment> {
    if self.payment_by_provider_order(&payment.provider_order_id).is_some() {
      return Err(StoreError::Conflict(format!(
        "A payment record for gateway order {} already exists",
        payment.provider_order_id
      )));
    }
    if let Some(order_id) = payment.order_id {
      if !self.orders.contains_key(&order_id) {
        return Err(StoreError::MissingReference {
          entity: "order",
          id: order_id,
        });
      }
    }
    let now = Utc::now();
    let row = Payment {
      id: self.next_id(),
      order_id: payment.order_id,
      provider_order_id: payment.provider_order_id.clone(),
      provider_payment_id: payment.provider_payment_id.clone(),
      signature: payment.signature.clone(),
      amount: payment.amount,
      currency: payment.currency.clone(),
      status: payment.status,
      created_at: now,
      verified_at: (payment.status == PaymentStatus::Success).then_some(now),
    };
    self.payments.insert(row.id, row.clone());
    Ok(row)
  }

  fn email_in_use(&self, email: &str, except: Option<i64>) -> bool {
    self.users.values().any(|u| u.email == email && Some(u.id) != except)
  }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts a product with an explicit stock level; test fixtures use this.
  pub async fn seed_product(&self, name: &str, price: rust_decimal::Decimal, stock_quantity: i32) -> Product {
    let mut tables = self.tables.lock().await;
    let product = Product {
      id: tables.next_id(),
      name: name.to_string(),
      description: None,
      price,
      discount_price: None,
      stock_quantity,
      category: crate::models::product::DEFAULT_CATEGORY.to_string(),
      image: String::new(),
      created_at: Utc::now(),
    };
    tables.products.insert(product.id, product.clone());
    product
  }

  pub async fn order_count(&self) -> usize {
    self.tables.lock().await.orders.len()
  }

  pub async fn order_item_count(&self) -> usize {
    self.tables.lock().await.order_items.len()
  }

  pub async fn payment_count(&self) -> usize {
    self.tables.lock().await.payments.len()
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
    let guard = Arc::clone(&self.tables).lock_owned().await;
    let working = guard.clone();
    debug!("Memory transaction opened.");
    Ok(Box::new(MemoryTx { guard, working }))
  }

  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    let tables = self.tables.lock().await;
    let mut products: Vec<Product> = tables.products.values().cloned().collect();
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(products)
  }

  async fn find_products(&self, ids: &[i64]) -> StoreResult<Vec<Product>> {
    let tables = self.tables.lock().await;
    Ok(
      tables
        .products
        .values()
        .filter(|p| ids.contains(&p.id))
        .cloned()
        .collect(),
    )
  }

  async fn get_product(&self, id: i64) -> StoreResult<Option<Product>> {
    Ok(self.tables.lock().await.products.get(&id).cloned())
  }

  async fn insert_product(&self, product: &NewProduct) -> StoreResult<Product> {
    let mut tables = self.tables.lock().await;
    let row = Product {
      id: tables.next_id(),
      name: product.name.clone(),
      description: product.description.clone(),
      price: product.price,
      discount_price: product.discount_price,
      stock_quantity: product.stock_quantity,
      category: product.category.clone(),
      image: product.image.clone(),
      created_at: Utc::now(),
    };
    tables.products.insert(row.id, row.clone());
    Ok(row)
  }

  async fn save_product(&self, product: &Product) -> StoreResult<Option<Product>> {
    let mut tables = self.tables.lock().await;
    Ok(tables.products.get_mut(&product.id).map(|stored| {
      let created_at = stored.created_at;
      *stored = Product {
        created_at,
        ..product.clone()
      };
      stored.clone()
    }))
  }

  async fn delete_product(&self, id: i64) -> StoreResult<bool> {
    let mut tables = self.tables.lock().await;
    if tables.order_items.values().any(|item| item.product_id == id) {
      return Err(StoreError::StillReferenced { entity: "product", id });
    }
    Ok(tables.products.remove(&id).is_some())
  }

  async fn order_rows(&self, user_id: Option<i64>) -> StoreResult<Vec<OrderLineRow>> {
    let tables = self.tables.lock().await;
    let mut orders: Vec<&Order> = tables
      .orders
      .values()
      .filter(|o| user_id.map_or(true, |uid| o.user_id == uid))
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let mut rows = Vec::new();
    for order in orders {
      let header = |line: Option<&OrderItem>| OrderLineRow {
        id: order.id,
        user_id: order.user_id,
        total_amount: order.total_amount,
        shipping_address: order.shipping_address.clone(),
        status: order.status,
        created_at: order.created_at,
        line_id: line.map(|l| l.id),
        product_id: line.map(|l| l.product_id),
        quantity: line.map(|l| l.quantity),
        price: line.map(|l| l.price),
        product_name: line.and_then(|l| tables.products.get(&l.product_id)).map(|p| p.name.clone()),
      };
      let lines: Vec<&OrderItem> = tables.order_items.values().filter(|i| i.order_id == order.id).collect();
      if lines.is_empty() {
        rows.push(header(None));
      } else {
        rows.extend(lines.into_iter().map(|line| header(Some(line))));
      }
    }
    Ok(rows)
  }

  async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
    Ok(self.tables.lock().await.orders.get(&id).cloned())
  }

  async fn order_items(&self, order_id: i64) -> StoreResult<Vec<OrderItem>> {
    let tables = self.tables.lock().await;
    Ok(
      tables
        .order_items
        .values()
        .filter(|i| i.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn update_order_status(&self, id: i64, status: OrderStatus) -> StoreResult<bool> {
    let mut tables = self.tables.lock().await;
    Ok(tables.orders.get_mut(&id).map(|o| o.status = status).is_some())
  }

  async fn insert_payment(&self, payment: &NewPayment) -> StoreResult<Payment> {
    self.tables.lock().await.insert_payment(payment)
  }

  async fn find_payment(&self, provider_order_id: &str) -> StoreResult<Option<Payment>> {
    Ok(self.tables.lock().await.payment_by_provider_order(provider_order_id).cloned())
  }

  async fn user_exists(&self, username: &str, email: &str) -> StoreResult<bool> {
    let tables = self.tables.lock().await;
    Ok(tables.users.values().any(|u| u.username == username || u.email == email))
  }

  async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
    let tables = self.tables.lock().await;
    Ok(
      tables
        .users
        .values()
        .find(|u| u.username == login || u.email == login)
        .cloned(),
    )
  }

  async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
    Ok(self.tables.lock().await.users.get(&id).cloned())
  }

  async fn insert_user(&self, user: &NewUser) -> StoreResult<User> {
    let mut tables = self.tables.lock().await;
    if tables.users.values().any(|u| u.username == user.username || u.email == user.email) {
      return Err(StoreError::Conflict("Username or email already exists".to_string()));
    }
    let row = User {
      id: tables.next_id(),
      username: user.username.clone(),
      email: user.email.clone(),
      password_hash: user.password_hash.clone(),
      full_name: user.full_name.clone(),
      phone: user.phone.clone(),
      address: user.address.clone(),
      created_at: Utc::now(),
    };
    tables.users.insert(row.id, row.clone());
    Ok(row)
  }

  async fn email_taken_by_other(&self, email: &str, user_id: i64) -> StoreResult<bool> {
    Ok(self.tables.lock().await.email_in_use(email, Some(user_id)))
  }

  async fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> StoreResult<Option<User>> {
    let mut tables = self.tables.lock().await;
    if tables.email_in_use(&update.email, Some(user_id)) {
      return Err(StoreError::Conflict("Email already in use".to_string()));
    }
    Ok(tables.users.get_mut(&user_id).map(|user| {
      user.email = update.email.clone();
      user.full_name = update.full_name.clone();
      user.phone = update.phone.clone();
      user.address = update.address.clone();
      user.clone()
    }))
  }

  async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
    let tables = self.tables.lock().await;
    Ok(tables.admins.values().find(|a| a.email == email).cloned())
  }

  async fn insert_admin(&self, name: &str, email: &str, password_hash: &str) -> StoreResult<Admin> {
    let mut tables = self.tables.lock().await;
    if tables.admins.values().any(|a| a.email == email) {
      return Err(StoreError::Conflict(format!("Admin {} already exists", email)));
    }
    let row = Admin {
      id: tables.next_id(),
      name: name.to_string(),
      email: email.to_string(),
      password_hash: password_hash.to_string(),
    };
    tables.admins.insert(row.id, row.clone());
    Ok(row)
  }
}

pub struct MemoryTx {
  guard: OwnedMutexGuard<Tables>,
  working: Tables,
}

#[async_trait]
impl StoreTx for MemoryTx {
  async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order> {
    self.working.insert_order(order)
  }

  async fn insert_order_item(&mut self, order_id: i64, line: &CartLine) -> StoreResult<OrderItem> {
    self.working.insert_order_item(order_id, line)
  }

  async fn decrement_stock(&mut self, product_id: i64, quantity: i32) -> StoreResult<i32> {
    self.working.decrement_stock(product_id, quantity)
  }

  async fn lock_payment(&mut self, provider_order_id: &str) -> StoreResult<Option<Payment>> {
    Ok(self.working.payment_by_provider_order(provider_order_id).cloned())
  }

  async fn insert_payment(&mut self, payment: &NewPayment) -> StoreResult<Payment> {
    self.working.insert_payment(payment)
  }

  async fn mark_payment_success(
    &mut self,
    payment_id: i64,
    provider_payment_id: &str,
    signature: &str,
  ) -> StoreResult<Payment> {
    let payment = self
      .working
      .payments
      .get_mut(&payment_id)
      .ok_or_else(|| StoreError::Conflict(format!("Payment {} disappeared", payment_id)))?;
    payment.status = PaymentStatus::Success;
    payment.provider_payment_id = Some(provider_payment_id.to_string());
    payment.signature = Some(signature.to_string());
    payment.verified_at = Some(Utc::now());
    Ok(payment.clone())
  }

  async fn confirm_order(&mut self, order_id: i64) -> StoreResult<bool> {
    match self.working.orders.get_mut(&order_id) {
      Some(order) if order.status == OrderStatus::Pending => {
        order.status = OrderStatus::Confirmed;
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    let MemoryTx { mut guard, working } = *self;
    *guard = working;
    debug!("Memory transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    debug!("Memory transaction rolled back.");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal::Decimal;

  async fn store_with_user() -> (MemoryStore, i64) {
    let store = MemoryStore::new();
    let user = store
      .insert_user(&NewUser {
        username: "asha".to_string(),
        email: "asha@example.com".to_string(),
        password_hash: "x".to_string(),
        full_name: None,
        phone: None,
        address: None,
      })
      .await
      .unwrap();
    (store, user.id)
  }

  #[tokio::test]
  async fn dropped_transaction_leaves_no_trace() {
    let (store, user_id) = store_with_user().await;
    let product = store.seed_product("Makhana", Decimal::from(50), 5).await;
    {
      let mut tx = store.begin().await.unwrap();
      tx.insert_order(&NewOrder {
        user_id,
        total_amount: Decimal::from(50),
        shipping_address: None,
      })
      .await
      .unwrap();
      tx.decrement_stock(product.id, 2).await.unwrap();
    }
    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock_quantity, 5);
  }

  #[tokio::test]
  async fn decrement_refuses_to_oversell() {
    let store = MemoryStore::new();
    let product = store.seed_product("Makhana", Decimal::from(50), 1).await;
    let mut tx = store.begin().await.unwrap();
    let err = tx.decrement_stock(product.id, 2).await.unwrap_err();
    assert!(matches!(err, StoreError::InsufficientStock { available: 1, .. }));
    assert!(matches!(
      tx.decrement_stock(999, 1).await,
      Err(StoreError::ProductNotFound { product_id: 999 })
    ));
  }

  #[tokio::test]
  async fn referenced_product_cannot_be_deleted() {
    let (store, user_id) = store_with_user().await;
    let product = store.seed_product("Makhana", Decimal::from(50), 5).await;
    let mut tx = store.begin().await.unwrap();
    let order = tx
      .insert_order(&NewOrder {
        user_id,
        total_amount: Decimal::from(50),
        shipping_address: None,
      })
      .await
      .unwrap();
    tx.insert_order_item(
      order.id,
      &CartLine {
        product_id: product.id,
        quantity: 1,
        price: Decimal::from(50),
      },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert!(matches!(
      store.delete_product(product.id).await,
      Err(StoreError::StillReferenced { .. })
    ));
  }
}
