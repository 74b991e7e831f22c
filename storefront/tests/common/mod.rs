// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::Level;

use storefront::config::AppConfig;
use storefront::models::{CartItemInput, NewUser, PlaceOrderRequest, Product, User};
use storefront::services::payment_mock::MockGateway;
use storefront::state::AppState;
use storefront::store::{MemoryStore, Store};

pub const TEST_KEY_ID: &str = "rzp_test_suite";
pub const TEST_SECRET: &str = "storefront-test-secret";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Application state over an in-memory store and the mock gateway, with
/// typed handles to both for assertions.
pub struct TestApp {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
  pub gateway: Arc<MockGateway>,
}

pub fn test_config() -> AppConfig {
  AppConfig::from_lookup(|name| match name {
    "DATABASE_URL" => Some("postgres://unused/storefront_test".to_string()),
    "RAZORPAY_KEY_ID" => Some(TEST_KEY_ID.to_string()),
    "RAZORPAY_KEY_SECRET" => Some(TEST_SECRET.to_string()),
    _ => None,
  })
  .expect("test configuration should load")
}

pub fn test_app() -> TestApp {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let gateway = Arc::new(MockGateway::new(TEST_KEY_ID, TEST_SECRET));
  let state = AppState::new(test_config(), store.clone(), gateway.clone());
  TestApp { state, store, gateway }
}

pub async fn seed_user(store: &MemoryStore, username: &str) -> User {
  store
    .insert_user(&NewUser {
      username: username.to_string(),
      email: format!("{}@example.com", username),
      password_hash: "unused".to_string(),
      full_name: None,
      phone: None,
      address: None,
    })
    .await
    .expect("seed user")
}

pub async fn stock_of(store: &MemoryStore, product: &Product) -> i32 {
  store
    .get_product(product.id)
    .await
    .expect("product lookup")
    .expect("product exists")
    .stock_quantity
}

pub fn line(product_id: i64, quantity: i32, price: i64) -> CartItemInput {
  CartItemInput {
    product_id: Some(product_id),
    id: None,
    quantity: Some(quantity),
    price: Some(Decimal::from(price)),
  }
}

pub fn cart(user_id: i64, total: i64, items: Vec<CartItemInput>) -> PlaceOrderRequest {
  PlaceOrderRequest {
    user_id: Some(user_id),
    total_amount: Some(Decimal::from(total)),
    shipping_address: Some("12 Lake Road".to_string()),
    items,
  }
}
