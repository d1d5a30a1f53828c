pub mod lifecycle_event;
pub mod store;
pub mod topic_event;
mod wire;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use lifecycle_event::*;
pub use store::{EventQuery, EventSink, InMemoryEventStore};
pub use topic_event::*;

use crate::invoke_context::InvokeContext;

/// Anything recorded to an [`EventSink`]: either a [`TopicEvent`] off the
/// per-topic log, or a [`LifecycleEvent`] describing a node/tool
/// invocation. Both share one wire format (see `wire.rs`).
#[derive(Debug, Clone)]
pub enum Event {
    Topic(TopicEvent),
    Lifecycle(LifecycleEvent),
}

impl Event {
    pub fn event_id(&self) -> Uuid {
        match self {
            Event::Topic(t) => t.event_id(),
            Event::Lifecycle(l) => l.event_id(),
        }
    }

    pub fn invoke_context(&self) -> &InvokeContext {
        match self {
            Event::Topic(t) => t.invoke_context(),
            Event::Lifecycle(l) => l.invoke_context(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::Topic(t) => t.timestamp(),
            Event::Lifecycle(l) => l.timestamp(),
        }
    }

    pub fn topic_name(&self) -> Option<&str> {
        match self {
            Event::Topic(t) => Some(t.topic_name()),
            Event::Lifecycle(_) => None,
        }
    }

    /// The topic offset this event was appended at, if it's a
    /// [`TopicEvent`] — lifecycle events aren't appended to any topic log
    /// and so carry no offset.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Event::Topic(t) => Some(t.offset()),
            Event::Lifecycle(_) => None,
        }
    }
}

impl From<TopicEvent> for Event {
    fn from(value: TopicEvent) -> Self {
        Event::Topic(value)
    }
}

impl From<LifecycleEvent> for Event {
    fn from(value: LifecycleEvent) -> Self {
        Event::Lifecycle(value)
    }
}
