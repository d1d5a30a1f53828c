//! The extension point a [`crate::node::Node`] wraps. Concrete tools
//! (echo, uppercase, LLM-backed, ...) live in the `flux-tool` crate and
//! implement this trait; this crate only needs the contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::invoke_context::InvokeContext;
use crate::message::Messages;
use crate::stream_result::StreamResult;

/// Tracing-tag kind a tool's span should carry, mirroring OpenInference's
/// span-kind semantic convention. Purely a tag for observability sinks —
/// the engine never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpanKind {
    Tool,
    Llm,
    Retriever,
    Embedding,
    Chain,
    Agent,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    #[error("timeout after {0:?}")]
    Timeout(std::time::Duration),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Tools are object-safe, `Send + Sync`, and async — a node holds one
/// behind a `Box<dyn Tool>` or `Arc<dyn Tool>`.
#[async_trait]
pub trait Tool: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn tool_type(&self) -> &str;

    /// Tracing-tag kind for this tool's span. Defaults to `Tool`; a
    /// retriever or LLM-backed tool overrides it so observability sinks
    /// can tell the difference without parsing `tool_type`.
    fn oi_span_type(&self) -> SpanKind {
        SpanKind::Tool
    }

    /// Invoke with the node's gathered input (already AND-gated across
    /// every subscribed topic). May return a pre-materialized value or a
    /// stream of fragments — see [`StreamResult`].
    async fn invoke(
        &self,
        invoke_context: &InvokeContext,
        input: Messages,
    ) -> Result<StreamResult, ToolError>;
}
