use std::sync::Mutex;

use super::Event;

/// Selects a subset of recorded events for `EventStore::query`. Every
/// field is optional; `None` matches anything.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub conversation_id: Option<String>,
    pub assistant_request_id: Option<String>,
    pub topic_name: Option<String>,
    /// Restrict to events appended at one of these topic offsets.
    /// Lifecycle events carry no offset, so they never match a query
    /// that sets this field.
    pub offset_set: Option<Vec<u64>>,
}

impl EventQuery {
    fn matches(&self, event: &Event) -> bool {
        if let Some(cid) = &self.conversation_id {
            if &event.invoke_context().conversation_id != cid {
                return false;
            }
        }
        if let Some(rid) = &self.assistant_request_id {
            if &event.invoke_context().assistant_request_id != rid {
                return false;
            }
        }
        if let Some(topic) = &self.topic_name {
            match event.topic_name() {
                Some(t) if t == topic => {}
                _ => return false,
            }
        }
        if let Some(offsets) = &self.offset_set {
            match event.offset() {
                Some(o) if offsets.contains(&o) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Append-only lifecycle log. Events are timestamped on insertion by the
/// sink, not by the caller — the core only needs a sink, the concrete
/// storage and indexing strategy is an external collaborator's concern.
pub trait EventSink: Send + Sync {
    fn record(&self, event: Event);
    fn query(&self, query: &EventQuery) -> Vec<Event>;
}

/// Default in-memory implementation: a single mutex guarding a flat
/// `Vec<Event>`, scanned linearly on query. Sufficient for one workflow
/// run; embedders wanting durable storage implement `EventSink` over
/// their own backend.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<Event>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for InMemoryEventStore {
    fn record(&self, event: Event) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.push(event);
    }

    fn query(&self, query: &EventQuery) -> Vec<Event> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.iter().filter(|e| query.matches(e)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::lifecycle_event::{LifecycleEvent, NodeFailedEvent};
    use crate::event::topic_event::PublishToTopicEvent;
    use crate::invoke_context::InvokeContext;
    use crate::message::{Message, Role};
    use chrono::Utc;
    use uuid::Uuid;

    fn failed_event(conversation_id: &str) -> Event {
        Event::Lifecycle(LifecycleEvent::NodeFailed(NodeFailedEvent {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            invoke_context: InvokeContext::new(conversation_id, "user"),
            node_name: "n1".into(),
            node_type: "Node".into(),
            subscribed_topics: vec![],
            publish_to_topics: vec![],
            error: "boom".into(),
        }))
    }

    #[test]
    fn query_filters_by_conversation_id() {
        let store = InMemoryEventStore::new();
        store.record(failed_event("conv-a"));
        store.record(failed_event("conv-b"));

        let matches = store.query(&EventQuery {
            conversation_id: Some("conv-a".into()),
            ..Default::default()
        });
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn store_grows_monotonically() {
        let store = InMemoryEventStore::new();
        assert_eq!(store.len(), 0);
        store.record(failed_event("conv"));
        assert_eq!(store.len(), 1);
        store.record(failed_event("conv"));
        assert_eq!(store.len(), 2);
    }

    fn topic_event(offset: u64) -> Event {
        Event::Topic(crate::event::TopicEvent::Publish(PublishToTopicEvent {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            topic_name: "t".into(),
            offset,
            invoke_context: InvokeContext::new("conv", "user"),
            data: vec![Message::new(Role::User, "x")],
            publisher_name: "pub".into(),
            publisher_type: "Node".into(),
            consumed_events: vec![],
        }))
    }

    #[test]
    fn query_filters_by_offset_set() {
        let store = InMemoryEventStore::new();
        store.record(topic_event(0));
        store.record(topic_event(1));
        store.record(topic_event(2));

        let matches = store.query(&EventQuery {
            offset_set: Some(vec![0, 2]),
            ..Default::default()
        });
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn offset_set_query_never_matches_lifecycle_events() {
        let store = InMemoryEventStore::new();
        store.record(failed_event("conv"));

        let matches = store.query(&EventQuery {
            offset_set: Some(vec![0]),
            ..Default::default()
        });
        assert!(matches.is_empty());
    }
}
