// tests/order_placement_tests.rs

mod common;

use common::*;
use rust_decimal::Decimal;
use serial_test::serial;
use storefront::errors::AppError;
use storefront::models::{CartItemInput, OrderStatus};
use storefront::pipelines::place_order;
use storefront::store::Store;

#[tokio::test]
#[serial]
async fn places_order_and_reserves_stock() {
  let app = test_app();
  let user = seed_user(&app.store, "asha").await;
  let makhana = app.store.seed_product("Roasted makhana", Decimal::from(50), 10).await;

  let placed = place_order(&app.state, cart(user.id, 100, vec![line(makhana.id, 2, 50)]))
    .await
    .expect("placement succeeds");

  assert_eq!(placed.order.status, OrderStatus::Pending);
  assert_eq!(placed.order.total_amount, Decimal::from(100));
  assert_eq!(placed.items.len(), 1);
  assert_eq!(placed.items[0].quantity, 2);
  assert_eq!(placed.items[0].price, Decimal::from(50));
  assert_eq!(stock_of(&app.store, &makhana).await, 8);

  let stored = app.store.order_items(placed.order.id).await.unwrap();
  assert_eq!(stored, placed.items);
}

#[tokio::test]
#[serial]
async fn missing_quantity_is_rejected_without_writes() {
  let app = test_app();
  let user = seed_user(&app.store, "bala").await;
  let makhana = app.store.seed_product("Peri peri makhana", Decimal::from(50), 10).await;

  let request = cart(
    user.id,
    100,
    vec![CartItemInput {
      product_id: Some(makhana.id),
      quantity: None,
      price: Some(Decimal::from(50)),
      ..Default::default()
    }],
  );
  let err = place_order(&app.state, request).await.unwrap_err();

  assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
  assert_eq!(app.store.order_count().await, 0);
  assert_eq!(app.store.order_item_count().await, 0);
  assert_eq!(stock_of(&app.store, &makhana).await, 10);
}

#[tokio::test]
#[serial]
async fn legacy_id_field_names_the_product() {
  let app = test_app();
  let user = seed_user(&app.store, "chitra").await;
  let makhana = app.store.seed_product("Mint makhana", Decimal::from(40), 3).await;

  let request = cart(
    user.id,
    40,
    vec![CartItemInput {
      id: Some(makhana.id),
      quantity: Some(1),
      price: Some(Decimal::from(40)),
      ..Default::default()
    }],
  );
  let placed = place_order(&app.state, request).await.unwrap();

  assert_eq!(placed.items[0].product_id, makhana.id);
  assert_eq!(stock_of(&app.store, &makhana).await, 2);
}

#[tokio::test]
#[serial]
async fn insufficient_stock_late_in_cart_rolls_back_everything() {
  let app = test_app();
  let user = seed_user(&app.store, "dev").await;
  let plenty = app.store.seed_product("Classic makhana", Decimal::from(30), 10).await;
  let scarce = app.store.seed_product("Saffron makhana", Decimal::from(90), 1).await;

  let request = cart(user.id, 240, vec![line(plenty.id, 5, 30), line(scarce.id, 1, 90), line(scarce.id, 1, 0)]);
  let err = place_order(&app.state, request).await.unwrap_err();

  assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
  assert_eq!(app.store.order_count().await, 0);
  assert_eq!(app.store.order_item_count().await, 0);
  assert_eq!(stock_of(&app.store, &plenty).await, 10);
  assert_eq!(stock_of(&app.store, &scarce).await, 1);
}

#[tokio::test]
#[serial]
async fn unknown_product_or_user_is_not_found() {
  let app = test_app();
  let user = seed_user(&app.store, "esha").await;
  let makhana = app.store.seed_product("Cheese makhana", Decimal::from(60), 5).await;

  let err = place_order(&app.state, cart(user.id, 60, vec![line(9_999, 1, 60)]))
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

  let err = place_order(&app.state, cart(9_999, 60, vec![line(makhana.id, 1, 60)]))
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

  assert_eq!(app.store.order_count().await, 0);
  assert_eq!(stock_of(&app.store, &makhana).await, 5);
}

#[tokio::test]
#[serial]
async fn concurrent_placements_never_oversell() {
  let app = test_app();
  let user = seed_user(&app.store, "farah").await;
  let makhana = app.store.seed_product("Himalayan salt makhana", Decimal::from(25), 7).await;

  let mut handles = Vec::new();
  for _ in 0..10 {
    let state = app.state.clone();
    let request = cart(user.id, 50, vec![line(makhana.id, 2, 25)]);
    handles.push(tokio::spawn(async move { place_order(&state, request).await }));
  }

  let mut succeeded = 0;
  for handle in handles {
    match handle.await.expect("task completes") {
      Ok(_) => succeeded += 1,
      Err(err) => assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err),
    }
  }

  assert_eq!(succeeded, 3);
  assert_eq!(stock_of(&app.store, &makhana).await, 7 - 2 * succeeded);
  assert_eq!(app.store.order_count().await, succeeded as usize);
}

#[tokio::test]
#[serial]
async fn oversized_price_is_a_validation_error_without_writes() {
  let app = test_app();
  let user = seed_user(&app.store, "gauri").await;
  let makhana = app.store.seed_product("Jaggery makhana", Decimal::from(70), 4).await;

  let request = cart(
    user.id,
    100,
    vec![CartItemInput {
      product_id: Some(makhana.id),
      quantity: Some(2),
      price: Some(Decimal::MAX),
      ..Default::default()
    }],
  );
  let outcome = tokio::spawn({
    let state = app.state.clone();
    async move { place_order(&state, request).await }
  })
  .await
  .expect("placement does not panic");

  let err = outcome.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
  assert_eq!(app.store.order_count().await, 0);
  assert_eq!(stock_of(&app.store, &makhana).await, 4);
}
