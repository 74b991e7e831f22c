// storeflow/src/core/context.rs

//! Handler types stored by a pipeline.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A step handler.
///
/// Receives a clone of the shared context and resolves to a control signal or
/// the pipeline's error. Lock guards taken on the context must be dropped
/// before any `.await` inside the handler.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

/// Describes the step that failed, handed to every failure hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
  pub step_name: String,
  /// `Display` rendering of the error that aborted the run.
  pub message: String,
}

/// A hook run after a step failed, before the error is returned to the caller.
///
/// A hook's own error is logged and does not replace the original error.
pub type FailureHook<TData, Err> = Box<
  dyn Fn(ContextData<TData>, StepFailure) -> Pin<Box<dyn Future<Output = Result<(), Err>> + Send>>
    + Send
    + Sync,
>;
