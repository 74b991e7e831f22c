// storefront/src/services/order_queries.rs

//! Read side of orders: the joined listing and the status update.

use std::collections::HashMap;
use tracing::{info, instrument};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Order, OrderLineView, OrderStatus, OrderView};
use crate::store::{OrderLineRow, Store};

/// Lists orders (all, or one user's) with their lines, newest first.
#[instrument(name = "order_queries::list_orders", skip(store), err(Display))]
pub async fn list_orders(store: &dyn Store, user_id: Option<i64>) -> AppResult<Vec<OrderView>> {
  let rows = store.order_rows(user_id).await?;
  let views = fold_order_rows(rows);
  info!(orders = views.len(), "Orders listed.");
  Ok(views)
}

/// Groups join rows by order id in one pass, keeping the order in which
/// orders first appear. Rows without a line give an empty item list.
pub fn fold_order_rows(rows: Vec<OrderLineRow>) -> Vec<OrderView> {
  let mut views: Vec<OrderView> = Vec::new();
  let mut index: HashMap<i64, usize> = HashMap::new();

  for row in rows {
    let line = match (row.line_id, row.product_id, row.quantity, row.price) {
      (Some(_), Some(product_id), Some(quantity), Some(price)) => Some(OrderLineView {
        product_id,
        quantity,
        price,
        product_name: row.product_name.clone(),
      }),
      _ => None,
    };

    let slot = *index.entry(row.id).or_insert_with(|| {
      views.push(OrderView {
        order: Order {
          id: row.id,
          user_id: row.user_id,
          total_amount: row.total_amount,
          shipping_address: row.shipping_address.clone(),
          status: row.status,
          created_at: row.created_at,
        },
        items: Vec::new(),
      });
      views.len() - 1
    });
    if let Some(line) = line {
      views[slot].items.push(line);
    }
  }
  views
}

/// Sets an order's status. The status must be one of the known values.
#[instrument(name = "order_queries::update_order_status", skip(store), err(Display))]
pub async fn update_order_status(store: &dyn Store, order_id: i64, status: &str) -> AppResult<OrderStatus> {
  let status: OrderStatus = status.parse()?;
  if !store.update_order_status(order_id, status).await? {
    return Err(AppError::NotFound("Order not found".to_string()));
  }
  info!(order_id, %status, "Order status updated.");
  Ok(status)
}
