use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;

use crate::event::TopicEvent;

/// Soft warning threshold for a single topic's log length (see
/// `FlowConfig::log_warning_size`). Exceeding it is only ever logged,
/// never rejected — there is no queue-level backpressure by design.
pub const DEFAULT_MAX_LOG_WARNING: usize = 1000;

#[derive(Default)]
struct QueueState {
    /// Contiguous, append-only log. `offset` is assigned at append time
    /// and equals the index into this vec.
    log: Vec<TopicEvent>,
    /// Per-consumer next-offset-to-read.
    consumed: HashMap<String, usize>,
    /// Per-consumer last-committed offset. `-1` (absent) means nothing
    /// committed yet.
    committed: HashMap<String, i64>,
    warned: bool,
}

/// Append-only ordered log of [`TopicEvent`] with per-consumer cursors.
///
/// `append` never blocks. `fetch` is synchronous and non-blocking;
/// `fetch_async` additionally waits (up to an optional timeout) for new
/// data to arrive. Both advance the consumer's `consumed` cursor
/// atomically with the read, so two concurrent fetches by the same
/// consumer id never see the same event — at-most-once delivery per
/// cursor without a separate ACK.
pub struct TopicEventQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl Default for TopicEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicEventQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
        }
    }

    /// Assign `offset = len(log)`, append, and wake any consumer waiting
    /// on `fetch_async`. Never blocks.
    pub fn append(&self, mut event: TopicEvent) -> TopicEvent {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let offset = state.log.len() as u64;
        event.set_offset(offset);
        state.log.push(event.clone());
        if !state.warned && state.log.len() > DEFAULT_MAX_LOG_WARNING {
            state.warned = true;
            tracing::warn!(
                len = state.log.len(),
                "topic log exceeds soft warning size; no backpressure is applied"
            );
        }
        drop(state);
        self.notify.notify_waiters();
        event
    }

    pub fn can_consume(&self, consumer_id: &str) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Self::can_consume_locked(&state, consumer_id)
    }

    fn can_consume_locked(state: &QueueState, consumer_id: &str) -> bool {
        let consumed = state.consumed.get(consumer_id).copied().unwrap_or(0);
        consumed < state.log.len()
    }

    /// Synchronous, non-blocking fetch. Returns `[]` if nothing new.
    pub fn try_fetch(&self, consumer_id: &str) -> Vec<TopicEvent> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Self::drain_locked(&mut state, consumer_id)
    }

    fn drain_locked(state: &mut QueueState, consumer_id: &str) -> Vec<TopicEvent> {
        let start = state.consumed.get(consumer_id).copied().unwrap_or(0);
        let batch: Vec<TopicEvent> = state.log[start..].to_vec();
        state
            .consumed
            .insert(consumer_id.to_string(), start + batch.len());
        batch
    }

    /// Like `try_fetch`, but if there's nothing new yet, waits for an
    /// `append` to signal — up to `timeout` if given. Returns `[]` on
    /// timeout.
    pub async fn fetch_async(
        &self,
        consumer_id: &str,
        timeout: Option<Duration>,
    ) -> Vec<TopicEvent> {
        loop {
            // Register for the notification *before* checking the
            // predicate, so an append that lands between the check and
            // the wait can't be missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                if Self::can_consume_locked(&state, consumer_id) {
                    return Self::drain_locked(&mut state, consumer_id);
                }
            }

            match timeout {
                Some(d) => {
                    if tokio::time::timeout(d, notified).await.is_err() {
                        return Vec::new();
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Advance `committed[consumer_id]` to `max(current, offset)`.
    /// Idempotent: a lower or equal offset is a no-op.
    pub fn commit(&self, consumer_id: &str, offset: u64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let offset = offset as i64;
        let entry = state.committed.entry(consumer_id.to_string()).or_insert(-1);
        if offset > *entry {
            *entry = offset;
        }
    }

    pub fn committed_offset(&self, consumer_id: &str) -> i64 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.committed.get(consumer_id).copied().unwrap_or(-1)
    }

    pub fn consumed_offset(&self, consumer_id: &str) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.consumed.get(consumer_id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear the log and all cursors. Caller contract: must not be
    /// called concurrently with any fetch — there is no recovery from a
    /// reset racing a fetch (see spec's error-handling design: this is a
    /// caller contract, not a runtime-checked condition).
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.log.clear();
        state.consumed.clear();
        state.committed.clear();
        state.warned = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ConsumeFromTopicEvent, PublishToTopicEvent};
    use crate::invoke_context::InvokeContext;
    use crate::message::{Message, Role};
    use std::sync::Arc;

    fn publish(queue: &TopicEventQueue, content: &str) -> TopicEvent {
        let ctx = InvokeContext::new("conv", "user");
        queue.append(TopicEvent::Publish(PublishToTopicEvent {
            event_id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            topic_name: "t".into(),
            offset: 0,
            invoke_context: ctx,
            data: vec![Message::new(Role::User, content)],
            publisher_name: "pub".into(),
            publisher_type: "External".into(),
            consumed_events: vec![],
        }))
    }

    #[test]
    fn append_assigns_dense_offsets() {
        let q = TopicEventQueue::new();
        let e0 = publish(&q, "a");
        let e1 = publish(&q, "b");
        assert_eq!(e0.offset(), 0);
        assert_eq!(e1.offset(), 1);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn try_fetch_advances_cursor_atomically() {
        let q = TopicEventQueue::new();
        publish(&q, "a");
        publish(&q, "b");

        let first = q.try_fetch("consumer-1");
        assert_eq!(first.len(), 2);
        // A second fetch by the same consumer sees nothing new.
        let second = q.try_fetch("consumer-1");
        assert!(second.is_empty());
    }

    #[test]
    fn independent_consumers_each_see_everything() {
        let q = TopicEventQueue::new();
        publish(&q, "a");

        assert_eq!(q.try_fetch("c1").len(), 1);
        assert_eq!(q.try_fetch("c2").len(), 1);
    }

    #[test]
    fn commit_is_idempotent_and_monotonic() {
        let q = TopicEventQueue::new();
        publish(&q, "a");
        publish(&q, "b");
        q.commit("c1", 1);
        assert_eq!(q.committed_offset("c1"), 1);
        q.commit("c1", 0); // lower offset: no-op
        assert_eq!(q.committed_offset("c1"), 1);
        q.commit("c1", 1); // equal: no-op but idempotent
        assert_eq!(q.committed_offset("c1"), 1);
    }

    #[test]
    fn reset_clears_log_and_cursors() {
        let q = TopicEventQueue::new();
        publish(&q, "a");
        q.try_fetch("c1");
        q.commit("c1", 0);
        q.reset();
        assert_eq!(q.len(), 0);
        assert_eq!(q.consumed_offset("c1"), 0);
        assert_eq!(q.committed_offset("c1"), -1);
    }

    #[tokio::test]
    async fn fetch_async_returns_empty_on_timeout() {
        let q = TopicEventQueue::new();
        let got = q.fetch_async("c1", Some(Duration::from_millis(20))).await;
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn fetch_async_wakes_on_append() {
        let q = Arc::new(TopicEventQueue::new());
        let q2 = q.clone();
        let waiter = tokio::spawn(async move {
            q2.fetch_async("c1", Some(Duration::from_secs(2))).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        publish(&q, "late");

        let got = waiter.await.unwrap();
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn consume_dummy_event_shape_compiles() {
        // ConsumeFromTopicEvent is exercised by the node/topic layer;
        // just confirm construction here.
        let _ = ConsumeFromTopicEvent {
            event_id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            topic_name: "t".into(),
            offset: 0,
            invoke_context: InvokeContext::new("c", "u"),
            data: vec![],
            consumer_name: "n".into(),
            consumer_type: "Node".into(),
        };
    }
}
