// storefront/src/web/routes.rs

use actix_web::{error, web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::web::handlers::{admin_handlers, auth_handlers, order_handlers, payment_handlers, product_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": 1, "message": "ok" }))
}

/// Malformed JSON bodies answer with the usual validation envelope.
fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
  AppError::Validation(format!("Invalid request body: {}", err)).into()
}

fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> error::Error {
  AppError::Validation(format!("Invalid query string: {}", err)).into()
}

fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> error::Error {
  AppError::Validation(format!("Invalid path parameter: {}", err)).into()
}

/// Mounts every route under `/api`. Used by `main` and by the HTTP tests.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .app_data(web::PathConfig::default().error_handler(path_error_handler))
    .service(
      web::scope("/api")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("", web::post().to(order_handlers::place_order_handler))
            .route("", web::put().to(order_handlers::update_order_status_handler)),
        )
        .service(
          web::scope("/payments")
            .route("/create", web::post().to(payment_handlers::create_payment_handler))
            .route("/verify", web::post().to(payment_handlers::verify_payment_handler)),
        )
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            .route("/find", web::post().to(product_handlers::find_products_handler))
            .route("/{product_id}", web::put().to(product_handlers::update_product_handler))
            .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler)),
        )
        .service(
          web::scope("/auth")
            .route("/signup", web::post().to(auth_handlers::signup_handler))
            .route("/login", web::post().to(auth_handlers::login_handler))
            .route("/logout", web::post().to(auth_handlers::logout_handler))
            .route("/check-session", web::get().to(auth_handlers::check_session_handler))
            .route("/profile/{user_id}", web::get().to(auth_handlers::get_profile_handler))
            .route("/profile", web::put().to(auth_handlers::update_profile_handler)),
        )
        .service(
          web::scope("/admin")
            .route("/login", web::post().to(admin_handlers::login_handler))
            .route("/logout", web::post().to(admin_handlers::logout_handler))
            .route("/check-auth", web::get().to(admin_handlers::check_auth_handler)),
        ),
    );
}
