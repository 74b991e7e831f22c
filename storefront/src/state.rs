// storefront/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::gateway::PaymentGateway;
use crate::services::payment_signature::PaymentSigner;
use crate::services::sessions::SessionStore;
use crate::store::Store;
use std::sync::Arc;
use storeflow::FlowRegistry;

/// Everything a request needs, constructed once in `main` (or by a test) and
/// cloned into each worker.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub sessions: Arc<SessionStore>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub signer: PaymentSigner,
}

impl AppState {
  /// Builds the state and registers every pipeline.
  pub fn new(config: AppConfig, store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Self {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    pipelines::register_all_pipelines(&flows);

    Self {
      store,
      flows,
      sessions: Arc::new(SessionStore::new(config.session_ttl)),
      signer: PaymentSigner::new(&config.razorpay_key_secret),
      gateway,
      config: Arc::new(config),
    }
  }
}
