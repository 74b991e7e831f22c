// storefront/src/pipelines/place_order_pipeline.rs

//! Order placement: the order row, its lines and the stock decrements are
//! written in one transaction, or not at all.

use serde::Serialize;
use storeflow::{ContextData, FlowRegistry, Pipeline, PipelineControl, PipelineResult, StepFailure};
use tracing::{debug, event, info, instrument, warn, Level};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewOrder, Order, OrderItem, PlaceOrderRequest};
use crate::pipelines::contexts::PlaceOrderCtxData;
use crate::state::AppState;
use crate::store::StoreError;

#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
  pub order: Order,
  pub items: Vec<OrderItem>,
}

pub fn register_place_order_pipeline(registry: &FlowRegistry<AppError>) {
  let mut p = Pipeline::<PlaceOrderCtxData, AppError>::new(&[
    ("validate_cart", false),
    ("open_transaction", false),
    ("insert_order", false),
    ("insert_line_items", false),
    ("commit_transaction", false),
  ]);

  // Step 1: every precondition, before anything touches the store
  p.on_root("validate_cart", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let cart = ctx_data.with(|c| c.request.validate())?;

      let lines_total = cart.lines_total()?;
      if lines_total != cart.total_amount {
        warn!(
          declared = %cart.total_amount,
          computed = %lines_total,
          "Order total does not match the sum of its lines."
        );
      }
      debug!(user_id = cart.user_id, lines = cart.lines.len(), "Cart validated.");
      ctx_data.update(|c| c.cart = Some(cart));
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("open_transaction", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (store, slot) = ctx_data.with(|c| (c.app_state.store.clone(), c.tx.clone()));
      slot.open(store.as_ref()).await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 3: the order header, always `pending`
  p.on_root("insert_order", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (slot, new_order) = ctx_data.with(|c| {
        (
          c.tx.clone(),
          c.cart.as_ref().map(|cart| NewOrder {
            user_id: cart.user_id,
            total_amount: cart.total_amount,
            shipping_address: cart.shipping_address.clone(),
          }),
        )
      });
      let new_order = new_order.ok_or_else(|| AppError::Internal("Cart missing after validation.".to_string()))?;

      let mut guard = slot.lock().await;
      let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
      let order = tx.insert_order(&new_order).await?;
      drop(guard);
      info!(order_id = order.id, user_id = order.user_id, "Order row inserted.");
      ctx_data.update(|c| c.order = Some(order));
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 4: lines in caller order, each followed by its conditional stock decrement
  p.on_root("insert_line_items", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (slot, order_id, lines) = ctx_data.with(|c| {
        (
          c.tx.clone(),
          c.order.as_ref().map(|o| o.id),
          c.cart.as_ref().map(|cart| cart.lines.clone()).unwrap_or_default(),
        )
      });
      let order_id = order_id.ok_or_else(|| AppError::Internal("Order id missing before line insert.".to_string()))?;

      let mut items = Vec::with_capacity(lines.len());
      {
        let mut guard = slot.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
        for line in &lines {
          let item = tx.insert_order_item(order_id, line).await?;
          let remaining = tx.decrement_stock(line.product_id, line.quantity).await?;
          debug!(
            order_id,
            product_id = line.product_id,
            quantity = line.quantity,
            remaining,
            "Line inserted and stock reserved."
          );
          items.push(item);
        }
      }
      ctx_data.update(|c| c.items = items);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("commit_transaction", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let slot = ctx_data.with(|c| c.tx.clone());
      slot.commit().await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Any failure after the transaction opened discards everything it wrote.
  p.on_failure(|ctx_data: ContextData<PlaceOrderCtxData>, failure: StepFailure| {
    Box::pin(async move {
      let slot = ctx_data.with(|c| c.tx.clone());
      if slot.rollback().await? {
        event!(Level::WARN, step = %failure.step_name, reason = %failure.message, "Order placement rolled back.");
      }
      Ok::<_, AppError>(())
    })
  });

  registry.register_pipeline(p);
  tracing::info!("Place-order pipeline registered.");
}

/// Places an order for the submitted cart and returns it with its lines.
#[instrument(name = "place_order", skip_all, fields(user_id = ?request.user_id, items = request.items.len()))]
pub async fn place_order(app_state: &AppState, request: PlaceOrderRequest) -> AppResult<PlacedOrder> {
  let ctx_data = ContextData::new(PlaceOrderCtxData::new(app_state.clone(), request));

  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {}
    PipelineResult::Stopped => {
      return Err(AppError::Internal("Order placement was halted by an internal step.".to_string()));
    }
  }

  ctx_data.with(|c| match &c.order {
    Some(order) => Ok(PlacedOrder {
      order: order.clone(),
      items: c.items.clone(),
    }),
    None => Err(AppError::Internal("Order placement completed without an order.".to_string())),
  })
}
