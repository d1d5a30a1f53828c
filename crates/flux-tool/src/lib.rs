//! Concrete [`flux_core::Tool`] implementations and a registry to look
//! them up by id.
//!
//! This crate deliberately stays small: the runtime's `Tool` trait lives
//! in `flux-core` (so `Node` can hold `Arc<dyn Tool>` without a circular
//! dependency), and concrete LLM/retriever/web-search tools are out of
//! scope here — only the deterministic example tools used by the test
//! suite and the CLI demos.

pub mod registry;
pub mod tools;

pub use registry::{RegistryError, ToolRegistry};
pub use tools::{EchoTool, StreamingEchoTool, UppercaseTool};
