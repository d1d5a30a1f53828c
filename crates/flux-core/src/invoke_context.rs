use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-request identity tuple threaded through every event a workflow run
/// produces, so downstream observers (tracing, the event store) can
/// correlate everything back to one top-level request.
///
/// Immutable for the lifetime of one top-level request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeContext {
    pub conversation_id: String,
    pub invoke_id: Uuid,
    pub assistant_request_id: String,
    pub user_id: String,
}

impl InvokeContext {
    /// Start a new top-level request for the given conversation/user.
    pub fn new(conversation_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            invoke_id: Uuid::new_v4(),
            assistant_request_id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
        }
    }
}
