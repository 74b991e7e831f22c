// storeflow/src/pipeline/definition.rs

use crate::core::context::{FailureHook, Handler};
use crate::core::step::StepDef;
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;

/// An ordered list of steps over the context data `TData`, whose handlers
/// fail with `Err`.
///
/// `Err` must absorb engine faults (`From<FlowError>`) so that a run has a
/// single error type.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) failure_hooks: Vec<FailureHook<TData, Err>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(step_name, optional)` pairs, run in the given order.
  pub fn new(step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|&(name, optional)| {
        if optional {
          StepDef::optional(name)
        } else {
          StepDef::required(name)
        }
      })
      .collect();

    Self {
      steps,
      on: HashMap::new(),
      after: HashMap::new(),
      failure_hooks: Vec::new(),
    }
  }

  pub fn steps(&self) -> &[StepDef] {
    &self.steps
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics on an unknown step name: registering a handler for a step that
  /// does not exist is a wiring bug, caught the first time the pipeline is built.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if let Err(e) = self.find_step(step_name) {
      panic!("storeflow setup error: {}", e);
    }
  }

  pub(crate) fn find_step(&self, step_name: &str) -> FlowResult<&StepDef> {
    self
      .steps
      .iter()
      .find(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) -> FlowResult<()> {
    let step = self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })?;
    step.optional = optional;
    Ok(())
  }
}
