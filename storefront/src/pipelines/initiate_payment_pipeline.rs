// storefront/src/pipelines/initiate_payment_pipeline.rs

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use storeflow::{ContextData, FlowRegistry, Pipeline, PipelineControl, PipelineResult};
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewPayment, OrderStatus, Payment};
use crate::pipelines::contexts::InitiatePaymentCtxData;
use crate::services::gateway::GatewayOrder;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct InitiatedPayment {
  pub order: GatewayOrder,
  pub key_id: String,
  pub payment: Payment,
}

/// Order totals are in major units; gateways take minor units.
pub fn to_minor_units(total: Decimal) -> Option<i64> {
  total.checked_mul(Decimal::ONE_HUNDRED)?.round().to_i64()
}

fn is_currency_code(code: &str) -> bool {
  code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

pub fn register_initiate_payment_pipeline(registry: &FlowRegistry<AppError>) {
  let mut p = Pipeline::<InitiatePaymentCtxData, AppError>::new(&[
    ("load_order", false),
    ("create_gateway_order", false),
    ("record_initiation", false),
  ]);

  // Step 1: only a pending order with a positive total can be paid
  p.on_root("load_order", |ctx_data: ContextData<InitiatePaymentCtxData>| {
    Box::pin(async move {
      let (store, order_id, currency) =
        ctx_data.with(|c| (c.app_state.store.clone(), c.order_id, c.currency.clone()));
      if !is_currency_code(&currency) {
        return Err(AppError::Validation(format!("Invalid currency '{}'", currency)));
      }

      let order = store
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
      if order.status != OrderStatus::Pending {
        return Err(AppError::Conflict(format!(
          "Order {} is {}; only pending orders can be paid",
          order.id, order.status
        )));
      }
      let amount_minor = to_minor_units(order.total_amount)
        .filter(|amount| *amount > 0)
        .ok_or_else(|| AppError::Validation("Invalid amount".to_string()))?;

      ctx_data.update(|c| c.amount_minor = Some(amount_minor));
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("create_gateway_order", |ctx_data: ContextData<InitiatePaymentCtxData>| {
    Box::pin(async move {
      let (gateway, order_id, currency, amount_minor) = ctx_data.with(|c| {
        (
          c.app_state.gateway.clone(),
          c.order_id,
          c.currency.clone(),
          c.amount_minor,
        )
      });
      let amount_minor =
        amount_minor.ok_or_else(|| AppError::Internal("Amount missing before gateway call.".to_string()))?;

      let gateway_order = gateway
        .create_order(amount_minor, &currency, &format!("order_{}", order_id))
        .await?;
      if gateway_order.amount != amount_minor {
        warn!(
          requested = amount_minor,
          confirmed = gateway_order.amount,
          "Gateway confirmed a different amount; recording the gateway's value."
        );
      }
      ctx_data.update(|c| c.gateway_order = Some(gateway_order));
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 3: the initiated record links the gateway order to ours
  p.on_root("record_initiation", |ctx_data: ContextData<InitiatePaymentCtxData>| {
    Box::pin(async move {
      let (store, order_id, gateway_order) =
        ctx_data.with(|c| (c.app_state.store.clone(), c.order_id, c.gateway_order.clone()));
      let gateway_order =
        gateway_order.ok_or_else(|| AppError::Internal("Gateway order missing before recording.".to_string()))?;

      let payment = store
        .insert_payment(&NewPayment::initiated(
          order_id,
          gateway_order.id.clone(),
          gateway_order.amount,
          gateway_order.currency.clone(),
        ))
        .await?;
      info!(order_id, gateway_order_id = %gateway_order.id, payment_record = payment.id, "Payment initiated.");
      ctx_data.update(|c| c.payment = Some(payment));
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  tracing::info!("Initiate-payment pipeline registered.");
}

/// Creates a gateway order for a pending order and records it as `initiated`.
#[instrument(name = "initiate_payment", skip(app_state))]
pub async fn initiate_payment(app_state: &AppState, order_id: i64, currency: Option<String>) -> AppResult<InitiatedPayment> {
  let currency = currency
    .map(|c| c.trim().to_ascii_uppercase())
    .filter(|c| !c.is_empty())
    .unwrap_or_else(|| app_state.config.default_currency.clone());
  let ctx_data = ContextData::new(InitiatePaymentCtxData {
    app_state: app_state.clone(),
    order_id,
    currency,
    amount_minor: None,
    gateway_order: None,
    payment: None,
  });

  if app_state.flows.run(ctx_data.clone()).await? == PipelineResult::Stopped {
    return Err(AppError::Internal("Payment initiation was halted by an internal step.".to_string()));
  }

  ctx_data.with(|c| match (&c.gateway_order, &c.payment) {
    (Some(order), Some(payment)) => Ok(InitiatedPayment {
      order: order.clone(),
      key_id: c.app_state.gateway.key_id().to_string(),
      payment: payment.clone(),
    }),
    _ => Err(AppError::Internal("Payment initiation completed without a gateway order.".to_string())),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn converts_totals_to_minor_units() {
    assert_eq!(to_minor_units(Decimal::new(10050, 2)), Some(10_050));
    assert_eq!(to_minor_units(Decimal::from(100)), Some(10_000));
    assert_eq!(to_minor_units(Decimal::new(1, 3)), Some(0));
    assert_eq!(to_minor_units(Decimal::MAX), None);
  }

  #[test]
  fn currency_codes_are_three_uppercase_letters() {
    assert!(is_currency_code("INR"));
    assert!(!is_currency_code("inr"));
    assert!(!is_currency_code("RUPEE"));
  }
}
