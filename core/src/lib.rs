// storeflow/src/lib.rs

//! Storeflow: an async step pipeline for storefront workflows.
//!
//! A pipeline is an ordered list of named steps operating on a shared
//! context (`ContextData<TData>`). It provides:
//!  - `on` handlers doing the work of a step and `after` handlers observing it.
//!  - Early stopping through `PipelineControl::Stop`.
//!  - Failure hooks that run, in registration order, whenever a step fails.
//!    This is where a workflow holding an open transaction rolls it back.
//!  - A type-keyed registry (`FlowRegistry`) so callers run a workflow by
//!    handing over its context, without naming the pipeline.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::{FailureHook, Handler, StepFailure};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::StepDef;

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;
