// storeflow/src/pipeline/execution.rs

//! `Pipeline::run()`.

use crate::core::context::StepFailure;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::step::StepDef;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// On the first error, every failure hook runs (in registration order) and
  /// then the error is returned. A `Stop` ends the run with
  /// `PipelineResult::Stopped` without running failure hooks.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline_context_data_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = info_span!(
        "pipeline_step",
        step_name = step_def.name.as_str(),
        step_index = step_idx,
        optional = step_def.optional
      );

      match self.run_step(step_def, &ctx_data).instrument(step_span).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => {
          event!(Level::INFO, step = %step_def.name, "Pipeline stopped by a handler.");
          return Ok(PipelineResult::Stopped);
        }
        Err(e) => {
          self.run_failure_hooks(&ctx_data, step_def, &e).await;
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  async fn run_step(&self, step_def: &StepDef, ctx_data: &ContextData<TData>) -> Result<PipelineControl, Err> {
    let on_handlers = non_empty(self.on.get(&step_def.name));
    let after_handlers = non_empty(self.after.get(&step_def.name));

    if on_handlers.is_none() && after_handlers.is_none() {
      if step_def.optional {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(PipelineControl::Continue);
      }
      event!(Level::ERROR, "Non-optional step has no handlers.");
      return Err(Err::from(FlowError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    }

    for (phase, handlers) in [("on", on_handlers), ("after", after_handlers)] {
      let Some(handlers) = handlers else { continue };
      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        let control = handler_fn(ctx_data.clone())
          .instrument(info_span!("handler", phase, handler_index = handler_idx))
          .await
          .inspect_err(|e| event!(Level::ERROR, error = %e, phase, "Handler failed."))?;
        if control == PipelineControl::Stop {
          return Ok(PipelineControl::Stop);
        }
      }
    }

    Ok(PipelineControl::Continue)
  }

  async fn run_failure_hooks(&self, ctx_data: &ContextData<TData>, step_def: &StepDef, error: &Err) {
    if self.failure_hooks.is_empty() {
      return;
    }
    let failure = StepFailure {
      step_name: step_def.name.clone(),
      message: error.to_string(),
    };
    event!(Level::WARN, step = %failure.step_name, hooks = self.failure_hooks.len(), "Running failure hooks.");
    for hook in &self.failure_hooks {
      if let Err(hook_err) = hook(ctx_data.clone(), failure.clone()).await {
        event!(
          Level::ERROR,
          step = %failure.step_name,
          error = %hook_err,
          original_error = %failure.message,
          "Failure hook failed."
        );
      }
    }
  }
}

fn non_empty<H>(handlers: Option<&Vec<H>>) -> Option<&[H]> {
  handlers.filter(|v| !v.is_empty()).map(Vec::as_slice)
}
