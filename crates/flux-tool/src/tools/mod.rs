//! Deterministic example tools: identity passthrough, a text transform,
//! and a fragment-emitting streamer. Used by the core test suite and the
//! CLI demos — concrete LLM/retriever/web-search tools are out of scope.

pub mod echo;
pub mod streaming_echo;
pub mod uppercase;

pub use echo::EchoTool;
pub use streaming_echo::StreamingEchoTool;
pub use uppercase::UppercaseTool;
