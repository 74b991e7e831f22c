// storefront/src/services/gateway.rs

//! Payment gateway client: creates gateway orders the customer then pays against.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::config::{AppConfig, GatewayKind};
use crate::errors::{AppError, Result as AppResult};
use crate::services::payment_mock::MockGateway;

/// An order as the gateway reports it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
  pub id: String,
  /// Minor currency units, as confirmed by the gateway.
  pub amount: i64,
  pub currency: String,
  #[serde(default)]
  pub receipt: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Public key handed to the client checkout widget.
  fn key_id(&self) -> &str;

  async fn create_order(&self, amount: i64, currency: &str, receipt: &str) -> AppResult<GatewayOrder>;
}

pub fn gateway_from_config(config: &AppConfig) -> AppResult<Arc<dyn PaymentGateway>> {
  match config.payment_gateway {
    GatewayKind::Mock => Ok(Arc::new(MockGateway::new(
      &config.razorpay_key_id,
      &config.razorpay_key_secret,
    ))),
    GatewayKind::Razorpay => Ok(Arc::new(RazorpayGateway::new(
      &config.razorpay_api_base,
      &config.razorpay_key_id,
      &config.razorpay_key_secret,
    )?)),
  }
}

pub struct RazorpayGateway {
  client: reqwest::Client,
  api_base: String,
  key_id: String,
  key_secret: String,
}

impl RazorpayGateway {
  pub fn new(api_base: &str, key_id: &str, key_secret: &str) -> AppResult<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(15))
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self {
      client,
      api_base: api_base.trim_end_matches('/').to_string(),
      key_id: key_id.to_string(),
      key_secret: key_secret.to_string(),
    })
  }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
  fn key_id(&self) -> &str {
    &self.key_id
  }

  #[instrument(name = "RazorpayGateway::create_order", skip(self), err(Display))]
  async fn create_order(&self, amount: i64, currency: &str, receipt: &str) -> AppResult<GatewayOrder> {
    let resp = self
      .client
      .post(format!("{}/v1/orders", self.api_base))
      .basic_auth(&self.key_id, Some(&self.key_secret))
      .json(&json!({
        "amount": amount,
        "currency": currency,
        "receipt": receipt,
        "payment_capture": 1,
      }))
      .send()
      .await
      .map_err(|e| AppError::Gateway(format!("Request to gateway failed: {}", e)))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      error!(%status, %body, "Gateway rejected order creation.");
      return Err(AppError::Gateway(format!("Gateway returned {}: {}", status, body)));
    }

    let order: GatewayOrder = resp
      .json()
      .await
      .map_err(|e| AppError::Gateway(format!("Unreadable gateway response: {}", e)))?;
    info!(gateway_order_id = %order.id, amount = order.amount, "Gateway order created.");
    Ok(order)
  }
}
