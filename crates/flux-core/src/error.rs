use thiserror::Error;

/// Errors raised by the event-driven workflow core.
///
/// `ToolFailure` and `InvalidTopology` are the only variants library code
/// outside this crate is expected to match on; the rest are diagnostic.
#[derive(Error, Debug)]
pub enum FluxError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("topic not found: {0}")]
    TopicNotFound(String),

    #[error("invalid workflow topology: {0}")]
    InvalidTopology(String),

    #[error("tool '{tool}' failed: {source}")]
    ToolFailure {
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("topic '{0}' rejected the published data: condition not met")]
    ConditionReject(String),

    #[error("quiescence timeout after {0:?}")]
    QuiescenceTimeout(std::time::Duration),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
