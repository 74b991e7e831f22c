// storefront/src/pipelines/verify_payment_pipeline.rs

//! Payment callback verification. Nothing is written unless the signature
//! matches; the record update and the order confirmation commit together.

use serde::Serialize;
use storeflow::{ContextData, FlowRegistry, Pipeline, PipelineControl, PipelineResult, StepFailure};
use tracing::{event, info, instrument, warn, Level};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewPayment, Payment, PaymentStatus};
use crate::pipelines::contexts::{VerificationOutcome, VerifyPaymentCtxData};
use crate::state::AppState;
use crate::store::StoreError;

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPayment {
  pub payment: Payment,
  pub outcome: VerificationOutcome,
  pub order_confirmed: bool,
}

pub fn register_verify_payment_pipeline(registry: &FlowRegistry<AppError>) {
  let mut p = Pipeline::<VerifyPaymentCtxData, AppError>::new(&[
    ("validate_callback", false),
    ("verify_signature", false),
    ("open_transaction", false),
    ("record_payment", false),
    ("commit_transaction", false),
  ]);

  p.on_root("validate_callback", |ctx_data: ContextData<VerifyPaymentCtxData>| {
    Box::pin(async move {
      let missing = ctx_data.update(|c| {
        c.provider_order_id = c.provider_order_id.trim().to_string();
        c.provider_payment_id = c.provider_payment_id.trim().to_string();
        c.signature = c.signature.trim().to_string();
        c.provider_order_id.is_empty() || c.provider_payment_id.is_empty() || c.signature.is_empty()
      });
      if missing {
        return Err(AppError::Validation("Missing payment verification fields".to_string()));
      }
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("verify_signature", |ctx_data: ContextData<VerifyPaymentCtxData>| {
    Box::pin(async move {
      let (signer, order_id, payment_id, signature) = ctx_data.with(|c| {
        (
          c.app_state.signer.clone(),
          c.provider_order_id.clone(),
          c.provider_payment_id.clone(),
          c.signature.clone(),
        )
      });
      if !signer.verify(&order_id, &payment_id, &signature)? {
        warn!(provider_order_id = %order_id, provider_payment_id = %payment_id, "Payment signature mismatch.");
        return Err(AppError::Verification("Invalid signature".to_string()));
      }
      info!(provider_order_id = %order_id, "Payment signature verified.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("open_transaction", |ctx_data: ContextData<VerifyPaymentCtxData>| {
    Box::pin(async move {
      let (store, slot) = ctx_data.with(|c| (c.app_state.store.clone(), c.tx.clone()));
      slot.open(store.as_ref()).await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 4: initiated -> success (confirming the owning order), replay, or a standalone record
  p.on_root("record_payment", |ctx_data: ContextData<VerifyPaymentCtxData>| {
    Box::pin(async move {
      let (slot, order_id, payment_id, signature) = ctx_data.with(|c| {
        (
          c.tx.clone(),
          c.provider_order_id.clone(),
          c.provider_payment_id.clone(),
          c.signature.clone(),
        )
      });

      let mut guard = slot.lock().await;
      let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
      let existing = tx.lock_payment(&order_id).await?;

      let (payment, outcome, order_confirmed) = match existing {
        Some(record) if record.status == PaymentStatus::Initiated => {
          let updated = tx.mark_payment_success(record.id, &payment_id, &signature).await?;
          let confirmed = match updated.order_id {
            Some(owning_order) => tx.confirm_order(owning_order).await?,
            None => false,
          };
          (updated, VerificationOutcome::Verified, confirmed)
        }
        Some(record) if record.provider_payment_id.as_deref() == Some(payment_id.as_str()) => {
          info!(payment_record = record.id, "Callback replayed for an already verified payment.");
          (record, VerificationOutcome::Replayed, false)
        }
        Some(record) => {
          warn!(
            payment_record = record.id,
            provider_order_id = %order_id,
            "Gateway order already verified with a different payment id."
          );
          return Err(AppError::Conflict(format!(
            "Gateway order {} is already paid by a different payment",
            order_id
          )));
        }
        None => {
          let created = tx
            .insert_payment(&NewPayment::standalone_success(
              order_id.clone(),
              payment_id.clone(),
              signature.clone(),
            ))
            .await?;
          (created, VerificationOutcome::Recorded, false)
        }
      };
      drop(guard);

      info!(
        payment_record = payment.id,
        outcome = ?outcome,
        linked_order = ?payment.order_id,
        order_confirmed,
        "Payment recorded."
      );
      ctx_data.update(|c| {
        c.payment = Some(payment);
        c.outcome = Some(outcome);
        c.order_confirmed = order_confirmed;
      });
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("commit_transaction", |ctx_data: ContextData<VerifyPaymentCtxData>| {
    Box::pin(async move {
      let slot = ctx_data.with(|c| c.tx.clone());
      slot.commit().await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_failure(|ctx_data: ContextData<VerifyPaymentCtxData>, failure: StepFailure| {
    Box::pin(async move {
      let slot = ctx_data.with(|c| c.tx.clone());
      if slot.rollback().await? {
        event!(Level::WARN, step = %failure.step_name, reason = %failure.message, "Payment recording rolled back.");
      }
      Ok::<_, AppError>(())
    })
  });

  registry.register_pipeline(p);
  tracing::info!("Verify-payment pipeline registered.");
}

/// Checks a gateway callback and records the payment it reports.
#[instrument(name = "verify_payment", skip(app_state, signature))]
pub async fn verify_payment(
  app_state: &AppState,
  provider_order_id: &str,
  provider_payment_id: &str,
  signature: &str,
) -> AppResult<VerifiedPayment> {
  let ctx_data = ContextData::new(VerifyPaymentCtxData::new(
    app_state.clone(),
    provider_order_id,
    provider_payment_id,
    signature,
  ));

  if app_state.flows.run(ctx_data.clone()).await? == PipelineResult::Stopped {
    return Err(AppError::Internal("Payment verification was halted by an internal step.".to_string()));
  }

  ctx_data.with(|c| match (&c.payment, c.outcome) {
    (Some(payment), Some(outcome)) => Ok(VerifiedPayment {
      payment: payment.clone(),
      outcome,
      order_confirmed: c.order_confirmed,
    }),
    _ => Err(AppError::Internal("Payment verification completed without a record.".to_string())),
  })
}
