// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::ProductPatch;
use crate::services::catalog;
use crate::state::AppState;
use crate::web::responses;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FindProductsPayload {
  pub product_ids: Option<Vec<i64>>,
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = catalog::list_products(app_state.store.as_ref()).await?;
  info!(count = products.len(), "Products listed.");
  Ok(responses::ok("Products retrieved successfully", products))
}

#[instrument(name = "handler::find_products", skip(app_state))]
pub async fn find_products_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<FindProductsPayload>,
) -> Result<HttpResponse, AppError> {
  let ids = req_payload
    .into_inner()
    .product_ids
    .ok_or_else(|| AppError::Validation("productIds must be an array".to_string()))?;
  let products = catalog::find_products(app_state.store.as_ref(), &ids).await?;
  Ok(responses::ok("Products retrieved successfully", products))
}

#[instrument(name = "handler::create_product", skip(app_state, req_payload))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let product = catalog::create_product(app_state.store.as_ref(), req_payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(json!({
    "status": 1,
    "message": "Product added successfully",
    "id": product.id,
    "data": product,
  })))
}

#[instrument(name = "handler::update_product", skip(app_state, req_payload), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  req_payload: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let product = catalog::update_product(app_state.store.as_ref(), path.into_inner(), req_payload.into_inner()).await?;
  Ok(responses::ok("Product updated successfully", product))
}

#[instrument(name = "handler::delete_product", skip(app_state), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  catalog::delete_product(app_state.store.as_ref(), path.into_inner()).await?;
  Ok(responses::message("Product deleted successfully"))
}
