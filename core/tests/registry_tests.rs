// tests/registry_tests.rs
mod common;

use common::*;
use serial_test::serial;
use storeflow::{ContextData, FlowError, FlowRegistry, Pipeline, PipelineControl, PipelineResult};

#[derive(Debug, Default)]
struct OtherContext {
  visited: bool,
}

#[tokio::test]
#[serial]
async fn test_registry_runs_pipeline_for_context_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("only", false)]);
  pipeline.on_root("only", recording_handler("only"));
  registry.register_pipeline(pipeline);

  let mut other = Pipeline::<OtherContext, TestError>::new(&[("visit", false)]);
  other.on_root("visit", |ctx: ContextData<OtherContext>| async move {
    ctx.update(|c| c.visited = true);
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  registry.register_pipeline(other);

  assert_eq!(registry.len(), 2);
  assert!(registry.is_registered::<TestContext>());

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(registry.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["only"]);

  let other_ctx = ContextData::new(OtherContext::default());
  registry.run(other_ctx.clone()).await.unwrap();
  assert!(other_ctx.read().visited);
}

#[tokio::test]
#[serial]
async fn test_registry_reports_unregistered_context() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  assert!(registry.is_empty());

  let err = registry.run(ContextData::new(OtherContext::default())).await.unwrap_err();
  match err {
    TestError::Flow(s) => assert!(s.contains("PipelineNotRegistered")),
    other => panic!("Expected PipelineNotRegistered, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_registry_with_flow_error_type() {
  setup_tracing();
  let registry = FlowRegistry::<FlowError>::default();
  let mut pipeline = Pipeline::<OtherContext, FlowError>::new(&[("fail", false)]);
  pipeline.on_root("fail", |_ctx: ContextData<OtherContext>| async move {
    Err::<PipelineControl, _>(FlowError::Internal("intentional".to_string()))
  });
  registry.register_pipeline(pipeline);

  match registry.run(ContextData::new(OtherContext::default())).await {
    Err(FlowError::Internal(s)) => assert_eq!(s, "intentional"),
    other => panic!("Expected FlowError::Internal, got {:?}", other),
  }
}
