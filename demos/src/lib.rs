//! Example assistants built only from in-scope primitives, equivalent to
//! the original runtime's `examples/` assistants — kept under a
//! differently-named directory since `examples/` is reserved for the
//! read-only retrieval pack this workspace was built from.
//!
//! Run via `flux-cli demo <name>`.

pub mod echo_assistant;
pub mod fan_out_fan_in_assistant;
