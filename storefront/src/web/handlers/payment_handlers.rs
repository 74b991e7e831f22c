// storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::pipelines;
use crate::state::AppState;
use crate::web::responses;

#[derive(Deserialize, Debug)]
pub struct CreatePaymentPayload {
  pub order_id: Option<i64>,
  pub currency: Option<String>,
}

/// Field names follow the gateway's checkout callback.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct VerifyPaymentPayload {
  pub razorpay_order_id: String,
  pub razorpay_payment_id: String,
  pub razorpay_signature: String,
}

#[instrument(name = "handler::create_payment", skip(app_state))]
pub async fn create_payment_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CreatePaymentPayload>,
) -> Result<HttpResponse, AppError> {
  let CreatePaymentPayload { order_id, currency } = req_payload.into_inner();
  let order_id = order_id.ok_or_else(|| AppError::Validation("Missing order_id".to_string()))?;

  let initiated = pipelines::initiate_payment(&app_state, order_id, currency).await?;
  info!(order_id, gateway_order_id = %initiated.order.id, "Payment order created.");
  Ok(HttpResponse::Ok().json(json!({
    "status": 1,
    "message": "Payment order created",
    "order": initiated.order,
    "key_id": initiated.key_id,
    "data": initiated.payment,
  })))
}

#[instrument(
  name = "handler::verify_payment",
  skip(app_state, req_payload),
  fields(gateway_order_id = %req_payload.razorpay_order_id)
)]
pub async fn verify_payment_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<VerifyPaymentPayload>,
) -> Result<HttpResponse, AppError> {
  let verified = pipelines::verify_payment(
    &app_state,
    &req_payload.razorpay_order_id,
    &req_payload.razorpay_payment_id,
    &req_payload.razorpay_signature,
  )
  .await?;
  Ok(responses::ok("Payment verified successfully", verified))
}
