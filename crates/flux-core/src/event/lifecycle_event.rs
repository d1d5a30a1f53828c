use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::invoke_context::InvokeContext;
use crate::message::Messages;
use crate::tool::SpanKind;

/// Emitted when a node begins an invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInvokeEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub invoke_context: InvokeContext,
    pub node_name: String,
    pub node_type: String,
    pub subscribed_topics: Vec<String>,
    pub publish_to_topics: Vec<String>,
    pub input: Messages,
}

/// Emitted when a node's invocation completes successfully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRespondEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub invoke_context: InvokeContext,
    pub node_name: String,
    pub node_type: String,
    pub subscribed_topics: Vec<String>,
    pub publish_to_topics: Vec<String>,
    pub output: Messages,
}

/// Emitted when a node's invocation fails. The consumed events are not
/// committed and the error propagates out of the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeFailedEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub invoke_context: InvokeContext,
    pub node_name: String,
    pub node_type: String,
    pub subscribed_topics: Vec<String>,
    pub publish_to_topics: Vec<String>,
    pub error: String,
}

/// Emitted when a node calls into its wrapped tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvokeEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub invoke_context: InvokeContext,
    pub tool_id: String,
    pub tool_name: String,
    pub tool_type: String,
    pub span_kind: SpanKind,
    pub input: Messages,
}

/// Emitted when a tool invocation completes successfully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRespondEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub invoke_context: InvokeContext,
    pub tool_id: String,
    pub tool_name: String,
    pub tool_type: String,
    pub output: Messages,
}

/// Emitted when a tool invocation raises. Recorded before the error
/// surfaces as a [`NodeFailedEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFailedEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub invoke_context: InvokeContext,
    pub tool_id: String,
    pub tool_name: String,
    pub tool_type: String,
    pub error: String,
}

/// Node/tool invocation lifecycle, recorded to the [`crate::event::EventSink`]
/// independently of the topic log. Never consumed by the scheduler — this
/// is purely an observability trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LifecycleEvent {
    NodeInvoke(NodeInvokeEvent),
    NodeRespond(NodeRespondEvent),
    NodeFailed(NodeFailedEvent),
    ToolInvoke(ToolInvokeEvent),
    ToolRespond(ToolRespondEvent),
    ToolFailed(ToolFailedEvent),
}

impl LifecycleEvent {
    pub fn event_id(&self) -> Uuid {
        match self {
            LifecycleEvent::NodeInvoke(e) => e.event_id,
            LifecycleEvent::NodeRespond(e) => e.event_id,
            LifecycleEvent::NodeFailed(e) => e.event_id,
            LifecycleEvent::ToolInvoke(e) => e.event_id,
            LifecycleEvent::ToolRespond(e) => e.event_id,
            LifecycleEvent::ToolFailed(e) => e.event_id,
        }
    }

    pub fn invoke_context(&self) -> &InvokeContext {
        match self {
            LifecycleEvent::NodeInvoke(e) => &e.invoke_context,
            LifecycleEvent::NodeRespond(e) => &e.invoke_context,
            LifecycleEvent::NodeFailed(e) => &e.invoke_context,
            LifecycleEvent::ToolInvoke(e) => &e.invoke_context,
            LifecycleEvent::ToolRespond(e) => &e.invoke_context,
            LifecycleEvent::ToolFailed(e) => &e.invoke_context,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LifecycleEvent::NodeInvoke(e) => e.timestamp,
            LifecycleEvent::NodeRespond(e) => e.timestamp,
            LifecycleEvent::NodeFailed(e) => e.timestamp,
            LifecycleEvent::ToolInvoke(e) => e.timestamp,
            LifecycleEvent::ToolRespond(e) => e.timestamp,
            LifecycleEvent::ToolFailed(e) => e.timestamp,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::NodeInvoke(_) => "NodeInvoke",
            LifecycleEvent::NodeRespond(_) => "NodeRespond",
            LifecycleEvent::NodeFailed(_) => "NodeFailed",
            LifecycleEvent::ToolInvoke(_) => "ToolInvoke",
            LifecycleEvent::ToolRespond(_) => "ToolRespond",
            LifecycleEvent::ToolFailed(_) => "ToolFailed",
        }
    }
}
