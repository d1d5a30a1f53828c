use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::invoke_context::InvokeContext;
use crate::message::Messages;

/// Produced by a consumer cursor-advance: one event per batch a node (or
/// the engine, on its behalf) pulled off a subscribed topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeFromTopicEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub topic_name: String,
    pub offset: u64,
    pub invoke_context: InvokeContext,
    pub data: Messages,
    pub consumer_name: String,
    pub consumer_type: String,
}

/// A publish to an intermediate or input topic. `consumed_events` are the
/// causal parents: the consume events that led the publisher to produce
/// this data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishToTopicEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub topic_name: String,
    pub offset: u64,
    pub invoke_context: InvokeContext,
    pub data: Messages,
    pub publisher_name: String,
    pub publisher_type: String,
    pub consumed_events: Vec<ConsumeFromTopicEvent>,
}

/// Same shape as [`PublishToTopicEvent`], flagged as reaching the
/// workflow boundary (the caller-facing output topic).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputTopicEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub topic_name: String,
    pub offset: u64,
    pub invoke_context: InvokeContext,
    pub data: Messages,
    pub publisher_name: String,
    pub publisher_type: String,
    pub consumed_events: Vec<ConsumeFromTopicEvent>,
}

/// An append-only log entry. Every variant carries the common envelope
/// fields (`event_id`, `timestamp`, `topic_name`, `offset`,
/// `invoke_context`, `data`) plus variant-specific context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TopicEvent {
    Publish(PublishToTopicEvent),
    Consume(ConsumeFromTopicEvent),
    Output(OutputTopicEvent),
}

impl TopicEvent {
    pub fn event_id(&self) -> Uuid {
        match self {
            TopicEvent::Publish(e) => e.event_id,
            TopicEvent::Consume(e) => e.event_id,
            TopicEvent::Output(e) => e.event_id,
        }
    }

    pub fn topic_name(&self) -> &str {
        match self {
            TopicEvent::Publish(e) => &e.topic_name,
            TopicEvent::Consume(e) => &e.topic_name,
            TopicEvent::Output(e) => &e.topic_name,
        }
    }

    pub fn offset(&self) -> u64 {
        match self {
            TopicEvent::Publish(e) => e.offset,
            TopicEvent::Consume(e) => e.offset,
            TopicEvent::Output(e) => e.offset,
        }
    }

    pub fn set_offset(&mut self, offset: u64) {
        match self {
            TopicEvent::Publish(e) => e.offset = offset,
            TopicEvent::Consume(e) => e.offset = offset,
            TopicEvent::Output(e) => e.offset = offset,
        }
    }

    pub fn data(&self) -> &Messages {
        match self {
            TopicEvent::Publish(e) => &e.data,
            TopicEvent::Consume(e) => &e.data,
            TopicEvent::Output(e) => &e.data,
        }
    }

    pub fn invoke_context(&self) -> &InvokeContext {
        match self {
            TopicEvent::Publish(e) => &e.invoke_context,
            TopicEvent::Consume(e) => &e.invoke_context,
            TopicEvent::Output(e) => &e.invoke_context,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TopicEvent::Publish(e) => e.timestamp,
            TopicEvent::Consume(e) => e.timestamp,
            TopicEvent::Output(e) => e.timestamp,
        }
    }

    /// `true` iff the first message in this event's data is a streaming
    /// fragment — the sole discriminator [`crate::aggregate`] uses.
    pub fn is_streaming(&self) -> bool {
        self.data().first().is_some_and(|m| m.is_streaming)
    }

    pub fn is_output(&self) -> bool {
        matches!(self, TopicEvent::Output(_))
    }

    /// Rebuild this event with new `data`, preserving its variant and
    /// every other field. Used by streaming aggregation to collapse
    /// several fragment events into one.
    pub fn with_data(&self, data: Messages) -> Self {
        match self {
            TopicEvent::Publish(e) => TopicEvent::Publish(PublishToTopicEvent {
                data,
                ..e.clone()
            }),
            TopicEvent::Consume(e) => TopicEvent::Consume(ConsumeFromTopicEvent {
                data,
                ..e.clone()
            }),
            TopicEvent::Output(e) => TopicEvent::Output(OutputTopicEvent {
                data,
                ..e.clone()
            }),
        }
    }
}
