// tests/http_api_tests.rs

mod common;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use serial_test::serial;

use common::*;
use storefront::config::AdminBootstrap;
use storefront::services::auth_service;
use storefront::services::payment_signature::PaymentSigner;
use storefront::services::sessions::{ADMIN_SESSION_COOKIE, USER_SESSION_COOKIE};
use storefront::web::configure_app_routes;

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn session_cookie(resp: &ServiceResponse, name: &str) -> Cookie<'static> {
  resp
    .response()
    .cookies()
    .find(|c| c.name() == name)
    .map(|c| c.into_owned())
    .expect("session cookie set")
}

#[actix_web::test]
#[serial]
async fn health_answers() {
  let app = test_app();
  let service = init_app!(app.state);

  let resp = test::call_service(&service, test::TestRequest::get().uri("/api/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
#[serial]
async fn signup_opens_a_session_until_logout() {
  let app = test_app();
  let service = init_app!(app.state);

  let signup = test::TestRequest::post()
    .uri("/api/auth/signup")
    .set_json(json!({
      "username": "meera",
      "email": "meera@example.com",
      "password": "secret1",
      "confirmPassword": "secret1",
      "fullName": "Meera Kapoor"
    }))
    .to_request();
  let resp = test::call_service(&service, signup).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let cookie = session_cookie(&resp, USER_SESSION_COOKIE);
  assert_eq!(cookie.http_only(), Some(true));
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], 1);
  assert_eq!(body["user"]["username"], "meera");
  assert!(body["user"].get("password_hash").is_none());

  let check = test::TestRequest::get()
    .uri("/api/auth/check-session")
    .cookie(cookie.clone())
    .to_request();
  let body: Value = test::call_and_read_body_json(&service, check).await;
  assert_eq!(body["logged_in"], true);
  assert_eq!(body["user"]["full_name"], "Meera Kapoor");

  let logout = test::TestRequest::post()
    .uri("/api/auth/logout")
    .cookie(cookie.clone())
    .to_request();
  let resp = test::call_service(&service, logout).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let check = test::TestRequest::get()
    .uri("/api/auth/check-session")
    .cookie(cookie)
    .to_request();
  let body: Value = test::call_and_read_body_json(&service, check).await;
  assert_eq!(body["status"], 0);
  assert_eq!(body["logged_in"], false);
}

#[actix_web::test]
#[serial]
async fn duplicate_signup_and_bad_login_are_rejected() {
  let app = test_app();
  let service = init_app!(app.state);
  let payload = json!({
    "username": "nikhil",
    "email": "nikhil@example.com",
    "password": "secret1",
    "confirmPassword": "secret1"
  });

  let first = test::call_service(
    &service,
    test::TestRequest::post().uri("/api/auth/signup").set_json(&payload).to_request(),
  )
  .await;
  assert_eq!(first.status(), StatusCode::CREATED);

  let again = test::call_service(
    &service,
    test::TestRequest::post().uri("/api/auth/signup").set_json(&payload).to_request(),
  )
  .await;
  assert_eq!(again.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(again).await;
  assert_eq!(body["message"], "Username or email already exists");

  let wrong = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/auth/login")
      .set_json(json!({ "username": "nikhil@example.com", "password": "not-it" }))
      .to_request(),
  )
  .await;
  assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(wrong).await;
  assert_eq!(body["status"], 0);
  assert_eq!(body["error"], "unauthorized");
  assert_eq!(body["message"], "Invalid username/email or password");

  let right = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/auth/login")
      .set_json(json!({ "username": "nikhil", "password": "secret1" }))
      .to_request(),
  )
  .await;
  assert_eq!(right.status(), StatusCode::OK);
}

#[actix_web::test]
#[serial]
async fn profile_update_needs_a_session() {
  let app = test_app();
  let service = init_app!(app.state);

  let anonymous = test::call_service(
    &service,
    test::TestRequest::put()
      .uri("/api/auth/profile")
      .set_json(json!({ "email": "x@example.com" }))
      .to_request(),
  )
  .await;
  assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

  let signup = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/auth/signup")
      .set_json(json!({
        "username": "oviya",
        "email": "oviya@example.com",
        "password": "secret1",
        "confirmPassword": "secret1"
      }))
      .to_request(),
  )
  .await;
  let cookie = session_cookie(&signup, USER_SESSION_COOKIE);
  let body: Value = test::read_body_json(signup).await;
  let user_id = body["user"]["id"].as_i64().unwrap();

  let update = test::call_service(
    &service,
    test::TestRequest::put()
      .uri("/api/auth/profile")
      .cookie(cookie)
      .set_json(json!({ "email": "oviya.new@example.com", "phone": "98765" }))
      .to_request(),
  )
  .await;
  assert_eq!(update.status(), StatusCode::OK);

  let profile: Value = test::call_and_read_body_json(
    &service,
    test::TestRequest::get()
      .uri(&format!("/api/auth/profile/{}", user_id))
      .to_request(),
  )
  .await;
  assert_eq!(profile["data"]["email"], "oviya.new@example.com");
  assert_eq!(profile["data"]["phone"], "98765");

  let missing = test::call_service(
    &service,
    test::TestRequest::get().uri("/api/auth/profile/9999").to_request(),
  )
  .await;
  assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[serial]
async fn orders_round_trip_over_http() {
  let app = test_app();
  let user = seed_user(&app.store, "pooja").await;
  let makhana = app.store.seed_product("Honey makhana", Decimal::from(50), 10).await;
  let service = init_app!(app.state);

  let create = test::TestRequest::post()
    .uri("/api/orders")
    .set_json(json!({
      "user_id": user.id,
      "total_amount": 100,
      "shipping_address": "4 Temple Street",
      "items": [{ "product_id": makhana.id, "quantity": 2, "price": 50 }]
    }))
    .to_request();
  let resp = test::call_service(&service, create).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let order_id = body["order_id"].as_i64().unwrap();
  assert_eq!(body["data"]["order"]["status"], "pending");

  let list: Value = test::call_and_read_body_json(
    &service,
    test::TestRequest::get()
      .uri(&format!("/api/orders?user_id={}", user.id))
      .to_request(),
  )
  .await;
  let orders = list["data"].as_array().unwrap();
  assert_eq!(orders.len(), 1);
  assert_eq!(orders[0]["id"], order_id);
  assert_eq!(orders[0]["items"][0]["product_name"], "Honey makhana");

  let archived = test::call_service(
    &service,
    test::TestRequest::put()
      .uri("/api/orders")
      .set_json(json!({ "order_id": order_id, "status": "archived" }))
      .to_request(),
  )
  .await;
  assert_eq!(archived.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(archived).await;
  assert_eq!(body["error"], "validation_error");

  let shipped = test::call_service(
    &service,
    test::TestRequest::put()
      .uri("/api/orders")
      .set_json(json!({ "order_id": order_id, "status": "shipped" }))
      .to_request(),
  )
  .await;
  assert_eq!(shipped.status(), StatusCode::OK);

  let oversell = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/orders")
      .set_json(json!({
        "user_id": user.id,
        "total_amount": 500,
        "items": [{ "id": makhana.id, "quantity": 10, "price": 50 }]
      }))
      .to_request(),
  )
  .await;
  assert_eq!(oversell.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
#[serial]
async fn malformed_body_gets_the_error_envelope() {
  let app = test_app();
  let service = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/api/orders")
    .insert_header(("content-type", "application/json"))
    .set_payload("{not json")
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], 0);
  assert_eq!(body["error"], "validation_error");
}

#[actix_web::test]
#[serial]
async fn payment_endpoints_create_and_verify() {
  let app = test_app();
  let user = seed_user(&app.store, "rohan").await;
  let makhana = app.store.seed_product("Jaggery makhana", Decimal::from(60), 5).await;
  let service = init_app!(app.state);

  let order: Value = test::call_and_read_body_json(
    &service,
    test::TestRequest::post()
      .uri("/api/orders")
      .set_json(json!({
        "user_id": user.id,
        "total_amount": 60,
        "items": [{ "product_id": makhana.id, "quantity": 1, "price": 60 }]
      }))
      .to_request(),
  )
  .await;
  let order_id = order["order_id"].as_i64().unwrap();

  let created: Value = test::call_and_read_body_json(
    &service,
    test::TestRequest::post()
      .uri("/api/payments/create")
      .set_json(json!({ "order_id": order_id }))
      .to_request(),
  )
  .await;
  assert_eq!(created["key_id"], TEST_KEY_ID);
  assert_eq!(created["order"]["amount"], 6_000);
  let gateway_order_id = created["order"]["id"].as_str().unwrap().to_string();

  let signature = PaymentSigner::new(TEST_SECRET)
    .sign(&gateway_order_id, "pay_http_1")
    .unwrap();
  let mut tampered = signature.clone();
  tampered.replace_range(0..1, if signature.starts_with('a') { "b" } else { "a" });

  let rejected = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/payments/verify")
      .set_json(json!({
        "razorpay_order_id": gateway_order_id,
        "razorpay_payment_id": "pay_http_1",
        "razorpay_signature": tampered
      }))
      .to_request(),
  )
  .await;
  assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(rejected).await;
  assert_eq!(body["error"], "verification_failed");

  let accepted: Value = test::call_and_read_body_json(
    &service,
    test::TestRequest::post()
      .uri("/api/payments/verify")
      .set_json(json!({
        "razorpay_order_id": gateway_order_id,
        "razorpay_payment_id": "pay_http_1",
        "razorpay_signature": signature
      }))
      .to_request(),
  )
  .await;
  assert_eq!(accepted["status"], 1);
  assert_eq!(accepted["data"]["outcome"], "verified");
  assert_eq!(accepted["data"]["order_confirmed"], true);
}

#[actix_web::test]
#[serial]
async fn product_catalog_endpoints() {
  let app = test_app();
  let service = init_app!(app.state);

  let created = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/products")
      .set_json(json!({ "name": "Smoked makhana", "price": "120.00", "discount_price": "99.50" }))
      .to_request(),
  )
  .await;
  assert_eq!(created.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(created).await;
  let product_id = body["id"].as_i64().unwrap();
  assert_eq!(body["data"]["category"], "makhana");
  assert_eq!(body["data"]["stock_quantity"], 0);

  let nameless = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/products")
      .set_json(json!({ "price": 10 }))
      .to_request(),
  )
  .await;
  assert_eq!(nameless.status(), StatusCode::BAD_REQUEST);

  let empty_patch = test::call_service(
    &service,
    test::TestRequest::put()
      .uri(&format!("/api/products/{}", product_id))
      .set_json(json!({}))
      .to_request(),
  )
  .await;
  assert_eq!(empty_patch.status(), StatusCode::BAD_REQUEST);

  let updated: Value = test::call_and_read_body_json(
    &service,
    test::TestRequest::put()
      .uri(&format!("/api/products/{}", product_id))
      .set_json(json!({ "stock_quantity": 25 }))
      .to_request(),
  )
  .await;
  assert_eq!(updated["data"]["stock_quantity"], 25);
  assert_eq!(updated["data"]["name"], "Smoked makhana");

  let found: Value = test::call_and_read_body_json(
    &service,
    test::TestRequest::post()
      .uri("/api/products/find")
      .set_json(json!({ "productIds": [product_id, 9999] }))
      .to_request(),
  )
  .await;
  assert_eq!(found["data"].as_array().unwrap().len(), 1);

  let deleted = test::call_service(
    &service,
    test::TestRequest::delete()
      .uri(&format!("/api/products/{}", product_id))
      .to_request(),
  )
  .await;
  assert_eq!(deleted.status(), StatusCode::OK);

  let gone = test::call_service(
    &service,
    test::TestRequest::delete()
      .uri(&format!("/api/products/{}", product_id))
      .to_request(),
  )
  .await;
  assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[serial]
async fn admin_session_is_separate_from_user_session() {
  let app = test_app();
  let bootstrap = AdminBootstrap {
    name: "Store Admin".to_string(),
    email: "admin@example.com".to_string(),
    password: "admin-pass".to_string(),
  };
  assert!(auth_service::ensure_admin(app.store.as_ref(), &bootstrap).await.unwrap());
  assert!(!auth_service::ensure_admin(app.store.as_ref(), &bootstrap).await.unwrap());
  let service = init_app!(app.state);

  let anonymous = test::call_service(
    &service,
    test::TestRequest::get().uri("/api/admin/check-auth").to_request(),
  )
  .await;
  assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

  let bad = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/admin/login")
      .set_json(json!({ "email": "admin@example.com", "password": "nope" }))
      .to_request(),
  )
  .await;
  assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

  let login = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/admin/login")
      .set_json(json!({ "email": "admin@example.com", "password": "admin-pass" }))
      .to_request(),
  )
  .await;
  assert_eq!(login.status(), StatusCode::OK);
  let cookie = session_cookie(&login, ADMIN_SESSION_COOKIE);

  let check: Value = test::call_and_read_body_json(
    &service,
    test::TestRequest::get()
      .uri("/api/admin/check-auth")
      .cookie(cookie.clone())
      .to_request(),
  )
  .await;
  assert_eq!(check["data"]["name"], "Store Admin");

  // An admin session does not log anyone in as a user.
  let as_user = Cookie::new(USER_SESSION_COOKIE, cookie.value().to_string());
  let user_check: Value = test::call_and_read_body_json(
    &service,
    test::TestRequest::get()
      .uri("/api/auth/check-session")
      .cookie(as_user)
      .to_request(),
  )
  .await;
  assert_eq!(user_check["logged_in"], false);
}
