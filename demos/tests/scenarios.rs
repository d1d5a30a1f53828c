//! End-to-end scenarios S1-S6 from the workflow core's testable
//! properties, run against topologies built the same way the demo
//! assistants are: `WorkflowBuilder` wiring `flux-tool` tools together.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flux_agent::{new_topic, reject_containing, WorkflowBuilder};
use flux_core::{
    FlowConfig, FluxError, InvokeContext, Message, Messages, Role, StreamResult, Tool, ToolError,
    TopicType,
};
use flux_demos::{echo_assistant, fan_out_fan_in_assistant};
use futures::StreamExt;

#[tokio::test]
async fn s1_echo() {
    let engine = echo_assistant::build().unwrap();
    let ctx = InvokeContext::new("conv", "user");
    let out = engine.invoke(ctx, vec![Message::new(Role::User, "hi")]).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].content.as_deref(), Some("hi"));
    assert_eq!(out[0].role, Role::User);
}

#[tokio::test]
async fn s2_streaming_echo() {
    let engine = echo_assistant::build_streaming().unwrap();

    // Blocking form aggregates the fragments into one message.
    let ctx = InvokeContext::new("conv", "user");
    let out = engine
        .invoke(ctx.clone(), vec![Message::new(Role::User, "Hel | lo  | world")])
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].content.as_deref(), Some("Hello world"));
    assert!(!out[0].is_streaming);

    // Streaming form yields the three fragments in order.
    let events: Vec<_> = engine
        .invoke_stream(ctx, vec![Message::new(Role::User, "Hel | lo  | world")])
        .collect()
        .await;
    let events: Vec<_> = events.into_iter().collect::<Result<_, _>>().unwrap();
    let fragments: Vec<_> = events.iter().map(|e| e.data()[0].content.clone()).collect();
    assert_eq!(
        fragments,
        vec![Some("Hel".to_string()), Some("lo ".to_string()), Some("world".to_string())]
    );
}

#[tokio::test]
async fn s3_fan_out_fan_in() {
    let engine = fan_out_fan_in_assistant::build().unwrap();
    let ctx = InvokeContext::new("conv", "user");
    let out = engine.invoke(ctx, vec![Message::new(Role::User, "go")]).await.unwrap();
    assert_eq!(out.len(), 1);

    // input->A, A->B (x), A->C (y), B->D, C->D, D->output: six commits in
    // total, the literal accounting check spec.md's S3 calls out.
    let metrics = engine.last_run_metrics().expect("a run just completed");
    assert_eq!(metrics.total_committed, 6);
}

#[tokio::test]
async fn s4_condition_reject_then_accept() {
    let input = new_topic("agent_input_topic", TopicType::Input);
    let output = Arc::new(
        flux_core::Topic::new("agent_output_topic", TopicType::Output)
            .with_condition(reject_containing("stop")),
    );
    let engine = WorkflowBuilder::new()
        .input_topic(input.clone())
        .output_topic(output.clone())
        .node(
            "echo",
            "EchoNode",
            vec![input],
            vec![output],
            Arc::new(flux_tool::EchoTool),
        )
        .build()
        .unwrap();

    // Rejected message: the output topic's condition silently drops it —
    // no event is appended, nothing hangs, and the caller gets an empty
    // result rather than the rejected content.
    let ctx = InvokeContext::new("conv", "user");
    let rejected = engine
        .invoke(ctx.clone(), vec![Message::new(Role::User, "please stop now")])
        .await
        .unwrap();
    assert!(rejected.is_empty());

    // A subsequent accepted message flows through normally.
    let ok = engine.invoke(ctx, vec![Message::new(Role::User, "continue")]).await.unwrap();
    assert_eq!(ok[0].content.as_deref(), Some("continue"));
}

struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn id(&self) -> &str {
        "failing"
    }
    fn name(&self) -> &str {
        "failing"
    }
    fn tool_type(&self) -> &str {
        "FailingTool"
    }
    async fn invoke(&self, _ctx: &InvokeContext, _input: Messages) -> Result<StreamResult, ToolError> {
        Err(ToolError::ExecutionFailed("boom".into()))
    }
}

#[tokio::test]
async fn s5_tool_failure_leaves_consume_uncommitted() {
    let input = new_topic("agent_input_topic", TopicType::Input);
    let output = new_topic("agent_output_topic", TopicType::Output);
    let sink = Arc::new(flux_core::InMemoryEventStore::new());
    let engine = WorkflowBuilder::new()
        .input_topic(input.clone())
        .output_topic(output)
        .with_sink(sink.clone())
        .node("failing", "FailingNode", vec![input.clone()], vec![], Arc::new(FailingTool))
        .build()
        .unwrap();

    let ctx = InvokeContext::new("conv", "user");
    let result = engine.invoke(ctx, vec![Message::new(Role::User, "x")]).await;
    assert!(matches!(result, Err(FluxError::ToolFailure { .. })));

    // The consumed event was never committed.
    assert_eq!(input.committed_offset("failing"), -1);

    let events = sink.query(&flux_core::EventQuery::default());
    let has_node_failed = events.iter().any(|e| {
        matches!(e, flux_core::Event::Lifecycle(flux_core::event::LifecycleEvent::NodeFailed(_)))
    });
    let has_node_respond = events.iter().any(|e| {
        matches!(e, flux_core::Event::Lifecycle(flux_core::event::LifecycleEvent::NodeRespond(_)))
    });
    assert!(has_node_failed);
    assert!(!has_node_respond);
}

struct SlowTool;

#[async_trait]
impl Tool for SlowTool {
    fn id(&self) -> &str {
        "slow"
    }
    fn name(&self) -> &str {
        "slow"
    }
    fn tool_type(&self) -> &str {
        "SlowTool"
    }
    async fn invoke(
        &self,
        _ctx: &InvokeContext,
        input: Messages,
    ) -> Result<StreamResult, ToolError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(StreamResult::value(input))
    }
}

#[tokio::test]
async fn s6_force_stop_returns_promptly() {
    let input = new_topic("agent_input_topic", TopicType::Input);
    let output = new_topic("agent_output_topic", TopicType::Output);
    let engine = Arc::new(
        WorkflowBuilder::new()
            .input_topic(input.clone())
            .output_topic(output)
            .with_config(FlowConfig::for_profile("CI"))
            .node("slow", "SlowNode", vec![input], vec![], Arc::new(SlowTool))
            .build()
            .unwrap(),
    );

    let ctx = InvokeContext::new("conv", "user");
    let engine_clone = engine.clone();
    let invoke_task = tokio::spawn(async move {
        engine_clone.invoke(ctx, vec![Message::new(Role::User, "x")]).await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    engine.stop();

    let result = tokio::time::timeout(Duration::from_secs(1), invoke_task)
        .await
        .expect("invoke should return promptly after stop()")
        .unwrap();
    // Forced stop while the tool is still in flight: the call returns
    // without erroring, with whatever (here: nothing) reached output.
    assert!(result.is_ok());
}
