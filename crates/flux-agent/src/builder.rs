//! Declarative assembly of a [`WorkflowEngine`] from nodes and topics.
//!
//! This is the thin "assistant builder" the runtime exposes: wiring a
//! node/topic graph together is all that's in scope here — there is no
//! agent marketplace, skill store, or YAML DSL on top of it.

use std::sync::Arc;

use flux_core::{
    Condition, EventSink, FlowConfig, FluxError, InMemoryEventStore, Node, Tool, Topic,
    TopicType, WorkflowEngine,
};

use crate::error::BuilderError;

/// Builds up a workflow's node/topic topology and validates it before
/// handing back a runnable [`WorkflowEngine`].
///
/// `input_topic`/`output_topic` default to the well-known
/// `agent_input_topic`/`agent_output_topic` names if never overridden.
pub struct WorkflowBuilder {
    nodes: Vec<Arc<Node>>,
    input_topic: Arc<Topic>,
    output_topic: Arc<Topic>,
    config: FlowConfig,
    sink: Option<Arc<dyn EventSink>>,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            input_topic: Arc::new(Topic::input()),
            output_topic: Arc::new(Topic::output()),
            config: FlowConfig::default(),
            sink: None,
        }
    }

    pub fn with_config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn input_topic(mut self, topic: Arc<Topic>) -> Self {
        self.input_topic = topic;
        self
    }

    pub fn output_topic(mut self, topic: Arc<Topic>) -> Self {
        self.output_topic = topic;
        self
    }

    /// Register a node directly.
    pub fn add_node(mut self, node: Arc<Node>) -> Self {
        self.nodes.push(node);
        self
    }

    /// Convenience: build and register a node from its parts in one call.
    pub fn node(
        self,
        name: impl Into<String>,
        node_type: impl Into<String>,
        subscribed_topics: Vec<Arc<Topic>>,
        publish_to_topics: Vec<Arc<Topic>>,
        tool: Arc<dyn Tool>,
    ) -> Self {
        let node = Arc::new(Node::new(name, node_type, subscribed_topics, publish_to_topics, tool));
        self.add_node(node)
    }

    /// Validate the topology, returning the first violation found.
    ///
    /// A node with zero subscribed topics is rejected — per the spec's
    /// decision, that topology is illegal rather than silently
    /// never-ready.
    fn validate(&self) -> Result<(), BuilderError> {
        if self.nodes.is_empty() {
            return Err(BuilderError::EmptyWorkflow);
        }
        for node in &self.nodes {
            if node.subscribed_topics().is_empty() {
                return Err(BuilderError::NodeHasNoSubscriptions(node.name.clone()));
            }
        }
        Ok(())
    }

    /// Validate the topology and build the runnable engine.
    pub fn build(self) -> Result<WorkflowEngine, FluxError> {
        self.validate()?;
        tracing::debug!(
            node_count = self.nodes.len(),
            input_topic = %self.input_topic.name,
            output_topic = %self.output_topic.name,
            "workflow topology validated"
        );

        let sink = self.sink.unwrap_or_else(|| Arc::new(InMemoryEventStore::new()));
        Ok(WorkflowEngine::with_sink(
            self.nodes,
            self.input_topic,
            self.output_topic,
            self.config,
            sink,
        ))
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A condition rejecting any message batch whose first message's content
/// contains `needle` — used by the S4 "condition reject" scenario and
/// anywhere a demo wants a simple content-based filter on a topic.
pub fn reject_containing(needle: impl Into<String>) -> Condition {
    let needle = needle.into();
    Arc::new(move |data| {
        !data
            .first()
            .and_then(|m| m.content.as_deref())
            .is_some_and(|c| c.contains(&needle))
    })
}

pub fn new_topic(name: impl Into<String>, topic_type: TopicType) -> Arc<Topic> {
    Arc::new(Topic::new(name, topic_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flux_core::{InvokeContext, Message, Messages, Role, StreamResult, ToolError};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn id(&self) -> &str {
            "echo"
        }
        fn name(&self) -> &str {
            "echo"
        }
        fn tool_type(&self) -> &str {
            "EchoTool"
        }
        async fn invoke(
            &self,
            _ctx: &InvokeContext,
            input: Messages,
        ) -> Result<StreamResult, ToolError> {
            Ok(StreamResult::value(input))
        }
    }

    #[test]
    fn rejects_empty_topology() {
        let result = WorkflowBuilder::new().build();
        assert!(matches!(result, Err(FluxError::InvalidTopology(_))));
    }

    #[test]
    fn rejects_node_with_no_subscriptions() {
        let node = Arc::new(Node::new("n", "T", vec![], vec![], Arc::new(EchoTool) as Arc<dyn Tool>));
        let result = WorkflowBuilder::new().add_node(node).build();
        assert!(matches!(result, Err(FluxError::InvalidTopology(_))));
    }

    #[tokio::test]
    async fn builds_and_runs_a_single_node_echo() {
        let input = Arc::new(Topic::input());
        let output = Arc::new(Topic::output());
        let engine = WorkflowBuilder::new()
            .input_topic(input.clone())
            .output_topic(output.clone())
            .node("echo-node", "EchoNode", vec![input], vec![output], Arc::new(EchoTool))
            .build()
            .unwrap();

        let ctx = InvokeContext::new("conv", "user");
        let out = engine.invoke(ctx, vec![Message::new(Role::User, "hi")]).await.unwrap();
        assert_eq!(out[0].content.as_deref(), Some("hi"));
    }

    #[test]
    fn reject_containing_filters_matching_content() {
        let condition = reject_containing("stop");
        assert!(!condition(&vec![Message::new(Role::User, "please stop")]));
        assert!(condition(&vec![Message::new(Role::User, "continue")]));
    }

    #[test]
    fn validate_reports_typed_builder_errors() {
        assert!(matches!(WorkflowBuilder::new().validate(), Err(BuilderError::EmptyWorkflow)));

        let node = Arc::new(Node::new("n", "T", vec![], vec![], Arc::new(EchoTool) as Arc<dyn Tool>));
        let builder = WorkflowBuilder::new().add_node(node);
        assert!(matches!(
            builder.validate(),
            Err(BuilderError::NodeHasNoSubscriptions(name)) if name == "n"
        ));
    }
}
