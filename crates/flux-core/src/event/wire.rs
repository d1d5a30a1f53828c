//! Pinned topic-event JSON wire format, used for persistence and tracing
//! compatibility. See the `EventSink` contract: the engine only needs a
//! sink, not a particular storage format, but whatever sink is plugged in
//! serializes through this shape.

use serde_json::{json, Value};

use super::lifecycle_event::LifecycleEvent;
use super::topic_event::TopicEvent;
use super::Event;
use crate::invoke_context::InvokeContext;

fn execution_context_json(ctx: &InvokeContext) -> Value {
    json!({
        "conversation_id": ctx.conversation_id,
        "execution_id": ctx.invoke_id,
        "assistant_request_id": ctx.assistant_request_id,
        "user_id": ctx.user_id,
    })
}

impl Event {
    /// Render this event in the pinned wire format.
    ///
    /// `OutputTopicEvent`s whose stream was still live when recorded
    /// serialize `data` as `null`; in this implementation every recorded
    /// event has already been fully materialized, so `data` is always
    /// present.
    pub fn to_wire_json(&self) -> Value {
        match self {
            Event::Topic(t) => topic_event_json(t),
            Event::Lifecycle(l) => lifecycle_event_json(l),
        }
    }
}

fn topic_event_json(event: &TopicEvent) -> Value {
    let (event_type, event_context) = match event {
        TopicEvent::Publish(e) => (
            "PublishToTopic",
            json!({
                "topic_name": e.topic_name,
                "offset": e.offset,
                "publisher_name": e.publisher_name,
                "publisher_type": e.publisher_type,
                "execution_context": execution_context_json(&e.invoke_context),
            }),
        ),
        TopicEvent::Consume(e) => (
            "ConsumeFromTopic",
            json!({
                "topic_name": e.topic_name,
                "offset": e.offset,
                "consumer_name": e.consumer_name,
                "consumer_type": e.consumer_type,
                "execution_context": execution_context_json(&e.invoke_context),
            }),
        ),
        TopicEvent::Output(e) => (
            "OutputTopic",
            json!({
                "topic_name": e.topic_name,
                "offset": e.offset,
                "publisher_name": e.publisher_name,
                "publisher_type": e.publisher_type,
                "execution_context": execution_context_json(&e.invoke_context),
            }),
        ),
    };

    json!({
        "event_id": event.event_id(),
        "event_type": event_type,
        "assistant_request_id": event.invoke_context().assistant_request_id,
        "timestamp": event.timestamp(),
        "event_context": event_context,
        "data": event.data(),
    })
}

fn lifecycle_event_json(event: &LifecycleEvent) -> Value {
    let (event_type, event_context, data) = match event {
        LifecycleEvent::NodeInvoke(e) => (
            "NodeInvoke",
            json!({
                "node_name": e.node_name,
                "node_type": e.node_type,
                "subscribed_topics": e.subscribed_topics,
                "publish_to_topics": e.publish_to_topics,
                "execution_context": execution_context_json(&e.invoke_context),
            }),
            json!(e.input),
        ),
        LifecycleEvent::NodeRespond(e) => (
            "NodeRespond",
            json!({
                "node_name": e.node_name,
                "node_type": e.node_type,
                "subscribed_topics": e.subscribed_topics,
                "publish_to_topics": e.publish_to_topics,
                "execution_context": execution_context_json(&e.invoke_context),
            }),
            json!(e.output),
        ),
        LifecycleEvent::NodeFailed(e) => (
            "NodeFailed",
            json!({
                "node_name": e.node_name,
                "node_type": e.node_type,
                "subscribed_topics": e.subscribed_topics,
                "publish_to_topics": e.publish_to_topics,
                "execution_context": execution_context_json(&e.invoke_context),
                "error": e.error,
            }),
            Value::Null,
        ),
        LifecycleEvent::ToolInvoke(e) => (
            "ToolInvoke",
            json!({
                "id": e.tool_id,
                "name": e.tool_name,
                "type": e.tool_type,
                "oi_span_type": e.span_kind,
                "execution_context": execution_context_json(&e.invoke_context),
            }),
            json!(e.input),
        ),
        LifecycleEvent::ToolRespond(e) => (
            "ToolRespond",
            json!({
                "id": e.tool_id,
                "name": e.tool_name,
                "type": e.tool_type,
                "execution_context": execution_context_json(&e.invoke_context),
            }),
            json!(e.output),
        ),
        LifecycleEvent::ToolFailed(e) => (
            "ToolFailed",
            json!({
                "id": e.tool_id,
                "name": e.tool_name,
                "type": e.tool_type,
                "execution_context": execution_context_json(&e.invoke_context),
                "error": e.error,
            }),
            Value::Null,
        ),
    };

    json!({
        "event_id": event.event_id(),
        "event_type": event_type,
        "assistant_request_id": event.invoke_context().assistant_request_id,
        "timestamp": event.timestamp(),
        "event_context": event_context,
        "data": data,
    })
}
