use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::queue::TopicEventQueue;
use crate::event::{ConsumeFromTopicEvent, PublishToTopicEvent, TopicEvent};
use crate::invoke_context::InvokeContext;
use crate::message::Messages;

pub const AGENT_INPUT_TOPIC: &str = "agent_input_topic";
pub const AGENT_OUTPUT_TOPIC: &str = "agent_output_topic";

/// Where a topic sits in the flow. Only `Output` is special-cased by the
/// engine (streaming aggregation, `invoke`/`invoke_stream` drain).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicType {
    Input,
    Intermediate,
    Output,
}

/// A predicate a topic applies to freshly published data before it's
/// accepted onto the log. Rejection surfaces to the publisher as
/// `FluxError::ConditionReject`-shaped control, not a panic.
pub type Condition = Arc<dyn Fn(&Messages) -> bool + Send + Sync>;

fn accept_all() -> Condition {
    Arc::new(|_| true)
}

/// Named, typed wrapper around a [`TopicEventQueue`]. `publisher_name` is
/// whichever node/external caller is allowed to publish (informational —
/// not enforced at this layer, the workflow topology enforces it).
#[derive(Clone)]
pub struct Topic {
    pub name: String,
    pub publisher_name: String,
    pub topic_type: TopicType,
    condition: Condition,
    queue: Arc<TopicEventQueue>,
}

impl Topic {
    pub fn new(name: impl Into<String>, topic_type: TopicType) -> Self {
        Self {
            name: name.into(),
            publisher_name: "external".into(),
            topic_type,
            condition: accept_all(),
            queue: Arc::new(TopicEventQueue::new()),
        }
    }

    pub fn input() -> Self {
        Self::new(AGENT_INPUT_TOPIC, TopicType::Input)
    }

    pub fn output() -> Self {
        Self::new(AGENT_OUTPUT_TOPIC, TopicType::Output)
    }

    pub fn with_publisher(mut self, publisher_name: impl Into<String>) -> Self {
        self.publisher_name = publisher_name.into();
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn is_output(&self) -> bool {
        self.topic_type == TopicType::Output
    }

    /// `true` iff `data` passes this topic's condition — callers that get
    /// `false` back should surface `FluxError::ConditionReject` rather
    /// than publish.
    pub fn accepts(&self, data: &Messages) -> bool {
        (self.condition)(data)
    }

    /// Publish `data` as `publisher_name`, recording which consume events
    /// (if any) caused it. Returns the appended event, with its assigned
    /// offset. Caller must have already checked `accepts`.
    pub fn publish(
        &self,
        invoke_context: &InvokeContext,
        publisher_name: &str,
        data: Messages,
        consumed_events: Vec<ConsumeFromTopicEvent>,
    ) -> TopicEvent {
        let variant = if self.is_output() {
            TopicEvent::Output(crate::event::OutputTopicEvent {
                event_id: Uuid::new_v4(),
                timestamp: Utc::now(),
                topic_name: self.name.clone(),
                offset: 0,
                invoke_context: invoke_context.clone(),
                data,
                publisher_name: publisher_name.to_string(),
                publisher_type: "Node".into(),
                consumed_events,
            })
        } else {
            TopicEvent::Publish(PublishToTopicEvent {
                event_id: Uuid::new_v4(),
                timestamp: Utc::now(),
                topic_name: self.name.clone(),
                offset: 0,
                invoke_context: invoke_context.clone(),
                data,
                publisher_name: publisher_name.to_string(),
                publisher_type: "Node".into(),
                consumed_events,
            })
        };
        self.queue.append(variant)
    }

    pub fn can_consume(&self, consumer_id: &str) -> bool {
        self.queue.can_consume(consumer_id)
    }

    pub fn try_fetch(&self, consumer_id: &str) -> Vec<TopicEvent> {
        self.queue.try_fetch(consumer_id)
    }

    pub async fn fetch_async(
        &self,
        consumer_id: &str,
        timeout: Option<std::time::Duration>,
    ) -> Vec<TopicEvent> {
        self.queue.fetch_async(consumer_id, timeout).await
    }

    pub fn commit(&self, consumer_id: &str, offset: u64) {
        self.queue.commit(consumer_id, offset);
    }

    pub fn committed_offset(&self, consumer_id: &str) -> i64 {
        self.queue.committed_offset(consumer_id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn reset(&self) {
        self.queue.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, Role};

    #[test]
    fn default_topic_accepts_everything() {
        let topic = Topic::new("t", TopicType::Intermediate);
        assert!(topic.accepts(&vec![Message::new(Role::User, "x")]));
    }

    #[test]
    fn condition_can_reject() {
        let topic = Topic::new("t", TopicType::Intermediate).with_condition(Arc::new(|data| {
            data.first().is_some_and(|m| m.content.as_deref() == Some("allowed"))
        }));
        assert!(!topic.accepts(&vec![Message::new(Role::User, "nope")]));
        assert!(topic.accepts(&vec![Message::new(Role::User, "allowed")]));
    }

    #[test]
    fn publish_assigns_offset_and_is_consumable() {
        let topic = Topic::new("t", TopicType::Intermediate);
        let ctx = InvokeContext::new("conv", "user");
        let event = topic.publish(&ctx, "node-a", vec![Message::new(Role::User, "hi")], vec![]);
        assert_eq!(event.offset(), 0);
        assert!(topic.can_consume("node-b"));
        assert_eq!(topic.try_fetch("node-b").len(), 1);
    }

    #[test]
    fn output_topic_publishes_output_variant() {
        let topic = Topic::output();
        let ctx = InvokeContext::new("conv", "user");
        let event = topic.publish(&ctx, "node-a", vec![Message::new(Role::Assistant, "hi")], vec![]);
        assert!(event.is_output());
    }
}
