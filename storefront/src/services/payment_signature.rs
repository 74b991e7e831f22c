// storefront/src/services/payment_signature.rs

//! HMAC-SHA256 signatures over gateway callbacks.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;

use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Signs and checks `"<provider_order_id>|<provider_payment_id>"` with the gateway secret.
#[derive(Clone)]
pub struct PaymentSigner {
  secret: Arc<str>,
}

impl fmt::Debug for PaymentSigner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PaymentSigner").field("secret", &"[REDACTED]").finish()
  }
}

impl PaymentSigner {
  pub fn new(secret: &str) -> Self {
    Self { secret: Arc::from(secret) }
  }

  /// Lowercase hex digest; the same inputs always give the same output.
  pub fn sign(&self, provider_order_id: &str, provider_payment_id: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
      .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
    mac.update(provider_order_id.as_bytes());
    mac.update(b"|");
    mac.update(provider_payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
  }

  /// Exact string comparison with the expected digest, in constant time for equal lengths.
  pub fn verify(&self, provider_order_id: &str, provider_payment_id: &str, provided: &str) -> Result<bool, AppError> {
    let expected = self.sign(provider_order_id, provider_payment_id)?;
    Ok(constant_time_eq(expected.as_bytes(), provided.as_bytes()))
  }
}

// Compares hex text, not MAC bytes: `Mac::verify_slice` would also accept uppercase hex once decoded.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
  if a.len() != b.len() {
    return false;
  }
  a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
