use std::sync::Arc;

use futures::StreamExt;

use crate::error::FluxError;
use crate::event::{
    ConsumeFromTopicEvent, Event, EventSink, LifecycleEvent, NodeFailedEvent, NodeInvokeEvent,
    NodeRespondEvent, ToolFailedEvent, ToolInvokeEvent, ToolRespondEvent,
};
use crate::invoke_context::InvokeContext;
use crate::message::Messages;
use crate::tool::Tool;
use crate::topic::Topic;

/// A scheduling unit: subscribes to one or more topics (AND-gated — it
/// only becomes ready once every subscription has something new),
/// invokes its wrapped tool with the gathered input, and publishes the
/// result to one or more downstream topics.
pub struct Node {
    pub name: String,
    pub node_type: String,
    subscribed_topics: Vec<Arc<Topic>>,
    publish_to_topics: Vec<Arc<Topic>>,
    tool: Arc<dyn Tool>,
}

/// Consumed input gathered from every subscription, ready to hand to the
/// wrapped tool, plus the per-topic high-water offsets to commit once
/// the invocation succeeds.
struct GatheredInput {
    data: Messages,
    consumed_events: Vec<ConsumeFromTopicEvent>,
    commits: Vec<(Arc<Topic>, u64)>,
}

/// What one `Node::invoke` step produced, for the engine to fold into
/// its scheduler-wide quiescence accounting.
pub struct NodeInvokeOutcome {
    /// Events newly appended to this node's downstream topics.
    pub published: Vec<crate::event::TopicEvent>,
    /// How many upstream topic events this step consumed and committed.
    /// Zero on a step that gathered no input (shouldn't normally
    /// happen — `is_ready` requires every subscription to be non-empty).
    pub consumed_count: usize,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        node_type: impl Into<String>,
        subscribed_topics: Vec<Arc<Topic>>,
        publish_to_topics: Vec<Arc<Topic>>,
        tool: Arc<dyn Tool>,
    ) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            subscribed_topics,
            publish_to_topics,
            tool,
        }
    }

    pub fn subscribed_topics(&self) -> &[Arc<Topic>] {
        &self.subscribed_topics
    }

    pub fn publish_to_topics(&self) -> &[Arc<Topic>] {
        &self.publish_to_topics
    }

    fn subscribed_topic_names(&self) -> Vec<String> {
        self.subscribed_topics.iter().map(|t| t.name.clone()).collect()
    }

    fn publish_to_topic_names(&self) -> Vec<String> {
        self.publish_to_topics.iter().map(|t| t.name.clone()).collect()
    }

    /// AND-gated readiness: every subscribed topic must have something
    /// new for this node's cursor.
    pub fn is_ready(&self) -> bool {
        !self.subscribed_topics.is_empty()
            && self.subscribed_topics.iter().all(|t| t.can_consume(&self.name))
    }

    fn gather_input(&self, invoke_context: &InvokeContext) -> GatheredInput {
        let mut data = Vec::new();
        let mut consumed_events = Vec::new();
        let mut commits = Vec::new();

        for topic in &self.subscribed_topics {
            let batch = topic.try_fetch(&self.name);
            let Some(last) = batch.last().map(|e| e.offset()) else {
                continue;
            };
            for event in &batch {
                data.extend(event.data().clone());
                consumed_events.push(ConsumeFromTopicEvent {
                    event_id: uuid::Uuid::new_v4(),
                    timestamp: chrono::Utc::now(),
                    topic_name: event.topic_name().to_string(),
                    offset: event.offset(),
                    invoke_context: invoke_context.clone(),
                    data: event.data().clone(),
                    consumer_name: self.name.clone(),
                    consumer_type: self.node_type.clone(),
                });
            }
            commits.push((topic.clone(), last));
        }

        GatheredInput { data, consumed_events, commits }
    }

    /// Run one scheduling step: gather input, invoke the tool, publish
    /// the result, commit consumed offsets. Returns the number of events
    /// published (for `NodeTracker::on_published`) and each output
    /// event's offset (the caller, usually `WorkflowEngine`, records
    /// these for committing once drained to the caller).
    ///
    /// On tool failure, consumed offsets are *not* committed — the
    /// caller decides whether to retry or propagate. This build
    /// propagates (see `FluxError::ToolFailure`).
    pub async fn invoke(
        &self,
        invoke_context: &InvokeContext,
        sink: &dyn EventSink,
    ) -> Result<NodeInvokeOutcome, FluxError> {
        let gathered = self.gather_input(invoke_context);

        sink.record(Event::Lifecycle(LifecycleEvent::NodeInvoke(NodeInvokeEvent {
            event_id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            invoke_context: invoke_context.clone(),
            node_name: self.name.clone(),
            node_type: self.node_type.clone(),
            subscribed_topics: self.subscribed_topic_names(),
            publish_to_topics: self.publish_to_topic_names(),
            input: gathered.data.clone(),
        })));

        sink.record(Event::Lifecycle(LifecycleEvent::ToolInvoke(ToolInvokeEvent {
            event_id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            invoke_context: invoke_context.clone(),
            tool_id: self.tool.id().to_string(),
            tool_name: self.tool.name().to_string(),
            tool_type: self.tool.tool_type().to_string(),
            span_kind: self.tool.oi_span_type(),
            input: gathered.data.clone(),
        })));

        let invocation = self.tool.invoke(invoke_context, gathered.data.clone()).await;

        let mut item_stream = match invocation {
            Ok(stream_result) => stream_result.into_stream(),
            Err(err) => {
                let message = err.to_string();
                sink.record(Event::Lifecycle(LifecycleEvent::ToolFailed(ToolFailedEvent {
                    event_id: uuid::Uuid::new_v4(),
                    timestamp: chrono::Utc::now(),
                    invoke_context: invoke_context.clone(),
                    tool_id: self.tool.id().to_string(),
                    tool_name: self.tool.name().to_string(),
                    tool_type: self.tool.tool_type().to_string(),
                    error: message.clone(),
                })));
                sink.record(Event::Lifecycle(LifecycleEvent::NodeFailed(NodeFailedEvent {
                    event_id: uuid::Uuid::new_v4(),
                    timestamp: chrono::Utc::now(),
                    invoke_context: invoke_context.clone(),
                    node_name: self.name.clone(),
                    node_type: self.node_type.clone(),
                    subscribed_topics: self.subscribed_topic_names(),
                    publish_to_topics: self.publish_to_topic_names(),
                    error: message,
                })));
                return Err(FluxError::ToolFailure {
                    tool: self.tool.name().to_string(),
                    source: anyhow::anyhow!(err),
                });
            }
        };

        // Publish each stream item the moment it arrives, one `TopicEvent`
        // per accepting topic per item — a streaming item is never held
        // back to be bundled with its siblings into one combined event.
        let mut output = Vec::new();
        let mut published = Vec::new();
        while let Some(message) = item_stream.next().await {
            output.push(message.clone());
            let item = vec![message];
            for topic in &self.publish_to_topics {
                if !topic.accepts(&item) {
                    continue;
                }
                let event = topic.publish(
                    invoke_context,
                    &self.name,
                    item.clone(),
                    gathered.consumed_events.clone(),
                );
                sink.record(Event::Topic(event.clone()));
                published.push(event);
            }
        }

        sink.record(Event::Lifecycle(LifecycleEvent::ToolRespond(ToolRespondEvent {
            event_id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            invoke_context: invoke_context.clone(),
            tool_id: self.tool.id().to_string(),
            tool_name: self.tool.name().to_string(),
            tool_type: self.tool.tool_type().to_string(),
            output: output.clone(),
        })));

        sink.record(Event::Lifecycle(LifecycleEvent::NodeRespond(NodeRespondEvent {
            event_id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            invoke_context: invoke_context.clone(),
            node_name: self.name.clone(),
            node_type: self.node_type.clone(),
            subscribed_topics: self.subscribed_topic_names(),
            publish_to_topics: self.publish_to_topic_names(),
            output,
        })));

        for (topic, offset) in gathered.commits {
            topic.commit(&self.name, offset);
        }

        Ok(NodeInvokeOutcome {
            published,
            consumed_count: gathered.consumed_events.len(),
        })
    }
}
