//! Event-driven workflow core: an append-only per-topic log, AND-gated
//! nodes wrapping tools, a quiescence-detecting scheduler, and the
//! lifecycle trail tying it all together.
//!
//! See [`engine::WorkflowEngine`] for the entry point; `flux-agent`
//! builds one from a declarative node/topic graph.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod invoke_context;
pub mod message;
pub mod node;
pub mod stream_result;
pub mod tool;
pub mod topic;
pub mod tracker;

pub use config::FlowConfig;
pub use engine::WorkflowEngine;
pub use error::FluxError;
pub use event::{Event, EventQuery, EventSink, InMemoryEventStore};
pub use invoke_context::InvokeContext;
pub use message::{Message, Messages, Role};
pub use node::Node;
pub use stream_result::StreamResult;
pub use tool::{SpanKind, Tool, ToolError};
pub use topic::{Condition, Topic, TopicType, AGENT_INPUT_TOPIC, AGENT_OUTPUT_TOPIC};
pub use tracker::{NodeTracker, TrackerMetrics};
