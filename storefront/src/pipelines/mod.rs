// storefront/src/pipelines/mod.rs

//! Defines and registers every pipeline the application runs.

use crate::errors::AppError;
use storeflow::FlowRegistry;

pub mod contexts;

pub mod initiate_payment_pipeline;
pub mod place_order_pipeline;
pub mod signin_pipeline;
pub mod signup_pipeline;
pub mod verify_payment_pipeline;

pub use initiate_payment_pipeline::{initiate_payment, InitiatedPayment};
pub use place_order_pipeline::{place_order, PlacedOrder};
pub use signin_pipeline::signin;
pub use signup_pipeline::{signup, SignupRequest};
pub use verify_payment_pipeline::{verify_payment, VerifiedPayment};

/// Registers all pipelines with `registry`. Called once while building `AppState`.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) {
  tracing::info!("Registering pipelines...");

  place_order_pipeline::register_place_order_pipeline(registry);
  verify_payment_pipeline::register_verify_payment_pipeline(registry);
  initiate_payment_pipeline::register_initiate_payment_pipeline(registry);
  signup_pipeline::register_signup_pipeline(registry);
  signin_pipeline::register_signin_pipeline(registry);

  tracing::info!(count = registry.len(), "All application pipelines registered.");
}
