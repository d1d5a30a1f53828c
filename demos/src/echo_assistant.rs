//! The simplest possible assistant: one node, subscribed to the input
//! topic, publishing straight to the output topic. Two variants cover
//! the literal S1/S2 scenarios: a plain echo (non-streaming) and a
//! streaming echo that emits its response as fragments.

use std::sync::Arc;

use flux_agent::WorkflowBuilder;
use flux_core::{FluxError, Topic, WorkflowEngine};
use flux_tool::{EchoTool, StreamingEchoTool};

/// S1: one node, identity tool, no streaming.
pub fn build() -> Result<WorkflowEngine, FluxError> {
    let input = Arc::new(Topic::input());
    let output = Arc::new(Topic::output());
    WorkflowBuilder::new()
        .input_topic(input.clone())
        .output_topic(output.clone())
        .node("echo", "EchoNode", vec![input], vec![output], Arc::new(EchoTool))
        .build()
}

/// S2: same topology, but the node's tool streams its response as three
/// fragments instead of returning one value.
pub fn build_streaming() -> Result<WorkflowEngine, FluxError> {
    let input = Arc::new(Topic::input());
    let output = Arc::new(Topic::output());
    WorkflowBuilder::new()
        .input_topic(input.clone())
        .output_topic(output.clone())
        .node(
            "streaming-echo",
            "StreamingEchoNode",
            vec![input],
            vec![output],
            Arc::new(StreamingEchoTool),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_core::{InvokeContext, Message, Role};
    use futures::StreamExt;

    #[tokio::test]
    async fn s1_echo_round_trip() {
        let engine = build().unwrap();
        let ctx = InvokeContext::new("conv", "user");
        let out = engine.invoke(ctx, vec![Message::new(Role::User, "hi")]).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content.as_deref(), Some("hi"));
        assert_eq!(out[0].role, Role::User);
    }

    #[tokio::test]
    async fn s2_streaming_echo_aggregates_on_blocking_invoke() {
        let engine = build_streaming().unwrap();
        let ctx = InvokeContext::new("conv", "user");
        let out = engine
            .invoke(ctx, vec![Message::new(Role::User, "Hel | lo  | world")])
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content.as_deref(), Some("Hello world"));
        assert!(!out[0].is_streaming);
    }

    #[tokio::test]
    async fn s2_streaming_echo_yields_fragments_on_invoke_stream() {
        let engine = build_streaming().unwrap();
        let ctx = InvokeContext::new("conv", "user");
        let events: Vec<_> = engine
            .invoke_stream(ctx, vec![Message::new(Role::User, "Hel | lo  | world")])
            .collect()
            .await;
        let events: Vec<_> = events.into_iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(events.len(), 3);
        let fragments: Vec<_> = events
            .iter()
            .map(|e| e.data()[0].content.clone().unwrap_or_default())
            .collect();
        assert_eq!(fragments, vec!["Hel", "lo ", "world"]);
        assert!(events.iter().all(|e| e.is_streaming()));
    }
}
