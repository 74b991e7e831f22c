// tests/order_query_tests.rs

mod common;

use common::*;
use rust_decimal::Decimal;
use serial_test::serial;
use storefront::errors::AppError;
use storefront::models::{NewOrder, OrderStatus};
use storefront::pipelines::place_order;
use storefront::services::order_queries::{list_orders, update_order_status};
use storefront::store::{Store, StoreTx};

#[tokio::test]
#[serial]
async fn lists_a_users_orders_newest_first_with_empty_item_lists() {
  let app = test_app();
  let user = seed_user(&app.store, "jaya").await;
  let other = seed_user(&app.store, "kabir").await;
  let salted = app.store.seed_product("Salted makhana", Decimal::from(30), 10).await;
  let masala = app.store.seed_product("Masala makhana", Decimal::from(45), 10).await;

  let with_items = place_order(
    &app.state,
    cart(user.id, 105, vec![line(salted.id, 2, 30), line(masala.id, 1, 45)]),
  )
  .await
  .unwrap();
  place_order(&app.state, cart(other.id, 30, vec![line(salted.id, 1, 30)]))
    .await
    .unwrap();

  // An order without lines can only come from outside the placement flow.
  let mut tx = app.store.begin().await.unwrap();
  let empty = tx
    .insert_order(&NewOrder {
      user_id: user.id,
      total_amount: Decimal::from(10),
      shipping_address: None,
    })
    .await
    .unwrap();
  tx.commit().await.unwrap();

  let orders = list_orders(app.store.as_ref(), Some(user.id)).await.unwrap();
  assert_eq!(orders.len(), 2);
  assert_eq!(orders[0].order.id, empty.id);
  assert!(orders[0].items.is_empty());
  assert_eq!(orders[1].order.id, with_items.order.id);
  assert_eq!(orders[1].items.len(), 2);
  assert_eq!(orders[1].items[0].product_id, salted.id);
  assert_eq!(orders[1].items[0].product_name.as_deref(), Some("Salted makhana"));
  assert_eq!(orders[1].items[1].quantity, 1);

  let json = serde_json::to_value(&orders[0]).unwrap();
  assert_eq!(json["items"], serde_json::json!([]));

  let everyone = list_orders(app.store.as_ref(), None).await.unwrap();
  assert_eq!(everyone.len(), 3);
}

#[tokio::test]
#[serial]
async fn unknown_status_leaves_the_order_unchanged() {
  let app = test_app();
  let user = seed_user(&app.store, "lata").await;
  let makhana = app.store.seed_product("Plain makhana", Decimal::from(15), 10).await;
  let placed = place_order(&app.state, cart(user.id, 15, vec![line(makhana.id, 1, 15)]))
    .await
    .unwrap();

  let err = update_order_status(app.store.as_ref(), placed.order.id, "archived")
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
  let order = app.store.get_order(placed.order.id).await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Pending);

  let status = update_order_status(app.store.as_ref(), placed.order.id, "shipped").await.unwrap();
  assert_eq!(status, OrderStatus::Shipped);
  let order = app.store.get_order(placed.order.id).await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Shipped);

  let missing = update_order_status(app.store.as_ref(), 9_999, "shipped").await.unwrap_err();
  assert!(matches!(missing, AppError::NotFound(_)), "got {:?}", missing);
}
