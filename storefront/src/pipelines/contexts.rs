// storefront/src/pipelines/contexts.rs

//! Data carried through each pipeline. Handlers receive these wrapped in
//! `storeflow::ContextData`.

use serde::Serialize;

use crate::models::{Order, OrderItem, Payment, PlaceOrderRequest, User, ValidatedCart};
use crate::services::gateway::GatewayOrder;
use crate::state::AppState;
use crate::store::TxSlot;

#[derive(Clone)]
pub struct PlaceOrderCtxData {
  pub app_state: AppState,
  pub request: PlaceOrderRequest,
  pub cart: Option<ValidatedCart>,
  pub tx: TxSlot,
  pub order: Option<Order>,
  pub items: Vec<OrderItem>,
}

impl PlaceOrderCtxData {
  pub fn new(app_state: AppState, request: PlaceOrderRequest) -> Self {
    Self {
      app_state,
      request,
      cart: None,
      tx: TxSlot::default(),
      order: None,
      items: Vec::new(),
    }
  }
}

/// What a verified callback did to the payment records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
  /// An initiated record moved to `success`.
  Verified,
  /// No record of the gateway order existed; a standalone record was written.
  Recorded,
  /// The same payment was verified before; nothing changed.
  Replayed,
}

#[derive(Clone)]
pub struct VerifyPaymentCtxData {
  pub app_state: AppState,
  pub provider_order_id: String,
  pub provider_payment_id: String,
  pub signature: String,
  pub tx: TxSlot,
  pub payment: Option<Payment>,
  pub outcome: Option<VerificationOutcome>,
  pub order_confirmed: bool,
}

impl VerifyPaymentCtxData {
  pub fn new(app_state: AppState, provider_order_id: &str, provider_payment_id: &str, signature: &str) -> Self {
    Self {
      app_state,
      provider_order_id: provider_order_id.to_string(),
      provider_payment_id: provider_payment_id.to_string(),
      signature: signature.to_string(),
      tx: TxSlot::default(),
      payment: None,
      outcome: None,
      order_confirmed: false,
    }
  }
}

#[derive(Clone)]
pub struct InitiatePaymentCtxData {
  pub app_state: AppState,
  pub order_id: i64,
  pub currency: String,
  pub amount_minor: Option<i64>,
  pub gateway_order: Option<GatewayOrder>,
  pub payment: Option<Payment>,
}

#[derive(Clone)]
pub struct SignupCtxData {
  pub app_state: AppState,
  pub username: String,
  pub email: String,
  pub password: String,
  pub confirm_password: String,
  pub full_name: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub created_user: Option<User>,
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub app_state: AppState,
  pub login: String,
  pub password: String,
  pub user: Option<User>,
}
