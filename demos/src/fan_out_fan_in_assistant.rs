//! The S3 scenario: one node fans out to two topics, two independent
//! nodes each consume one branch and fan back in, and a final node waits
//! on both branches (AND-gated readiness) before publishing to output.
//!
//! Topology:
//!
//! ```text
//! input -> A -> (x, y)
//! x -> B -> z_from_b  \
//!                       D -> output
//! y -> C -> z_from_c  /
//! ```
//!
//! `D` subscribes to both `z_from_b` and `z_from_c`; it only becomes
//! ready once each has something new, and its tool merges both branches'
//! content into a single output message.

use std::sync::Arc;

use async_trait::async_trait;
use flux_agent::{new_topic, WorkflowBuilder};
use flux_core::{
    FluxError, InvokeContext, Messages, StreamResult, Tool, ToolError, TopicType, WorkflowEngine,
};
use flux_tool::EchoTool;

/// Concatenates every gathered message's content into one output
/// message, taking the role of the first. Used by the fan-in node `D`:
/// by the time it runs it has gathered one message from each of its two
/// subscribed topics, in subscription-declaration order.
struct MergeTool;

#[async_trait]
impl Tool for MergeTool {
    fn id(&self) -> &str {
        "merge"
    }
    fn name(&self) -> &str {
        "merge"
    }
    fn tool_type(&self) -> &str {
        "MergeTool"
    }
    async fn invoke(
        &self,
        _ctx: &InvokeContext,
        input: Messages,
    ) -> Result<StreamResult, ToolError> {
        let Some(role) = input.first().map(|m| m.role) else {
            return Ok(StreamResult::value(Vec::new()));
        };
        let content: String = input.iter().filter_map(|m| m.content.as_deref()).collect();
        Ok(StreamResult::value(vec![flux_core::Message::new(role, content)]))
    }
}

pub fn build() -> Result<WorkflowEngine, FluxError> {
    let input = new_topic("agent_input_topic", TopicType::Input);
    let output = new_topic("agent_output_topic", TopicType::Output);
    let x = new_topic("x", TopicType::Intermediate);
    let y = new_topic("y", TopicType::Intermediate);
    let z_from_b = new_topic("z_from_b", TopicType::Intermediate);
    let z_from_c = new_topic("z_from_c", TopicType::Intermediate);

    WorkflowBuilder::new()
        .input_topic(input.clone())
        .output_topic(output.clone())
        .node("a", "FanOutNode", vec![input], vec![x.clone(), y.clone()], Arc::new(EchoTool))
        .node("b", "BranchNode", vec![x], vec![z_from_b.clone()], Arc::new(EchoTool))
        .node("c", "BranchNode", vec![y], vec![z_from_c.clone()], Arc::new(EchoTool))
        .node("d", "FanInNode", vec![z_from_b, z_from_c], vec![output], Arc::new(MergeTool))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_core::{Message, Role};

    #[tokio::test]
    async fn one_input_produces_exactly_one_output() {
        let engine = build().unwrap();
        let ctx = InvokeContext::new("conv", "user");
        let out = engine.invoke(ctx, vec![Message::new(Role::User, "go")]).await.unwrap();
        assert_eq!(out.len(), 1);
        // D gathers one "go" from each branch, in subscription order.
        assert_eq!(out[0].content.as_deref(), Some("gogo"));
    }
}
