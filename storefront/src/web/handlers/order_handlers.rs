// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::PlaceOrderRequest;
use crate::pipelines;
use crate::services::order_queries;
use crate::state::AppState;
use crate::web::responses;

#[derive(Deserialize, Debug)]
pub struct ListOrdersQuery {
  pub user_id: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateStatusPayload {
  pub order_id: Option<i64>,
  pub status: Option<String>,
}

#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let orders = order_queries::list_orders(app_state.store.as_ref(), query.user_id).await?;
  Ok(responses::ok("Orders retrieved successfully", orders))
}

#[instrument(
  name = "handler::place_order",
  skip(app_state, req_payload),
  fields(user_id = ?req_payload.user_id, items = req_payload.items.len())
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let placed = pipelines::place_order(&app_state, req_payload.into_inner()).await?;
  info!(order_id = placed.order.id, "Order placed.");

  Ok(HttpResponse::Created().json(json!({
    "status": 1,
    "message": "Order created successfully",
    "order_id": placed.order.id,
    "data": placed,
  })))
}

#[instrument(name = "handler::update_order_status", skip(app_state))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<UpdateStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let UpdateStatusPayload { order_id, status } = req_payload.into_inner();
  let (Some(order_id), Some(status)) = (order_id, status.filter(|s| !s.is_empty())) else {
    return Err(AppError::Validation("Missing order_id or status".to_string()));
  };

  let status = order_queries::update_order_status(app_state.store.as_ref(), order_id, &status).await?;
  Ok(responses::ok(
    "Order status updated successfully",
    json!({ "order_id": order_id, "status": status }),
  ))
}
