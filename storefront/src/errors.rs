// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storeflow::FlowError;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("Payment verification failed: {0}")]
  Verification(String),

  #[error("{0}")]
  Auth(String),

  #[error("Store error: {0}")]
  Store(StoreError),

  #[error("Payment gateway error: {0}")]
  Gateway(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Machine-readable kind sent in the `error` field of error responses.
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "validation_error",
      AppError::NotFound(_) => "not_found",
      AppError::Conflict(_) => "conflict",
      AppError::Verification(_) => "verification_failed",
      AppError::Auth(_) => "unauthorized",
      AppError::Store(_) => "store_error",
      AppError::Gateway(_) => "gateway_error",
      AppError::Config(_) => "config_error",
      AppError::Workflow { .. } => "workflow_error",
      AppError::Internal(_) => "internal_error",
    }
  }

  fn is_server_fault(&self) -> bool {
    self.status_code().is_server_error()
  }
}

/// Store failures carrying a business meaning become client errors; the rest stay server faults.
impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::ProductNotFound { .. } | StoreError::MissingReference { .. } => AppError::NotFound(err.to_string()),
      StoreError::InsufficientStock { .. } | StoreError::StillReferenced { .. } | StoreError::Conflict(_) => {
        AppError::Conflict(err.to_string())
      }
      StoreError::Database(_) | StoreError::TransactionClosed => AppError::Store(err),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::Verification(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
      AppError::Store(_)
      | AppError::Config(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let body = if self.is_server_fault() {
      tracing::error!(application_error = %self, kind = self.kind(), "Responding with server error");
      let message = match self {
        AppError::Store(_) => "Database operation failed",
        AppError::Gateway(_) => "Payment provider error",
        AppError::Config(_) => "Configuration issue",
        AppError::Workflow { .. } => "Workflow processing error",
        _ => "An internal error occurred",
      };
      json!({"status": 0, "message": message, "error": self.kind(), "detail": self.to_string()})
    } else {
      tracing::warn!(application_error = %self, kind = self.kind(), "Responding with client error");
      json!({"status": 0, "message": self.to_string(), "error": self.kind()})
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn store_errors_map_to_http_statuses() {
    let stock: AppError = StoreError::InsufficientStock {
      product_id: 1,
      requested: 3,
      available: 1,
    }
    .into();
    assert_eq!(stock.status_code(), StatusCode::CONFLICT);

    let missing: AppError = StoreError::ProductNotFound { product_id: 9 }.into();
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    let closed: AppError = StoreError::TransactionClosed.into();
    assert_eq!(closed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(closed.kind(), "store_error");
  }

  #[test]
  fn verification_is_a_distinct_bad_request() {
    let err = AppError::Verification("signature mismatch".to_string());
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.kind(), "verification_failed");
    assert_ne!(err.kind(), AppError::Validation(String::new()).kind());
  }
}
