// storeflow/src/core/control.rs

//! Flow control signals and run outcomes.

/// Returned by a handler to continue with the pipeline or halt it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// Halt now. Remaining handlers of this step and all later steps are skipped.
  /// Failure hooks do not run: a stop is not an error.
  Stop,
}

/// Outcome of a pipeline run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  Completed,
  Stopped,
}
