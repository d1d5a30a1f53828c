//! Thin assistant builder: wires nodes and topics into a runnable
//! [`flux_core::WorkflowEngine`].
//!
//! Deliberately narrow — no agent marketplace, skill store, or YAML DSL;
//! those are out of scope for this runtime. See `flux-demos` for example
//! topologies built with [`WorkflowBuilder`].

pub mod builder;
pub mod error;

pub use builder::{new_topic, reject_containing, WorkflowBuilder};
pub use error::BuilderError;
