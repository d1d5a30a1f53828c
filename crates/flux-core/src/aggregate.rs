//! Streaming aggregation at the output-topic boundary.
//!
//! A node that streams its response publishes a sequence of
//! `is_streaming` fragment events; everywhere *inside* the flow those
//! stay as separate events. Only at the edge the caller actually
//! observes — the output topic, consumed via `invoke` (not
//! `invoke_stream`) — are consecutive fragments collapsed into one
//! materialized message per topic, content concatenated in arrival
//! order. `invoke_stream` callers see the fragments as they land and
//! never go through this path.

use crate::event::TopicEvent;
use crate::message::Message;

/// Collapse consecutive streaming fragments in `events` into single
/// materialized events. Non-streaming events pass through unchanged. A
/// run of fragments ends either at a non-streaming event or at the end
/// of the slice; the merged event keeps the first fragment's envelope
/// (`event_id`, `offset`, ...) with content concatenated and
/// `is_streaming` cleared.
pub fn aggregate_output_events(events: Vec<TopicEvent>) -> Vec<TopicEvent> {
    let mut out = Vec::with_capacity(events.len());
    let mut pending: Option<TopicEvent> = None;

    for event in events {
        if !event.is_streaming() {
            if let Some(p) = pending.take() {
                out.push(finalize_event(p));
            }
            out.push(event);
            continue;
        }

        match pending.take() {
            None => pending = Some(event),
            Some(acc) => pending = Some(merge_fragment(acc, event)),
        }
    }

    if let Some(p) = pending.take() {
        out.push(finalize_event(p));
    }

    out
}

/// Flush a (possibly single-fragment) pending run: clear `is_streaming`
/// on its message before it leaves the aggregation boundary. A run of
/// exactly one fragment never reaches `merge_fragment`, so this is the
/// only place that guarantees every flushed event is non-streaming.
fn finalize_event(event: TopicEvent) -> TopicEvent {
    let mut data = event.data().clone();
    if let Some(head) = data.first_mut() {
        finalize(head);
    }
    event.with_data(data)
}

fn merge_fragment(acc: TopicEvent, next: TopicEvent) -> TopicEvent {
    let mut data = acc.data().clone();
    let Some(head) = data.first_mut() else {
        return acc;
    };
    if let Some(tail) = next.data().first() {
        let merged_content = match (&head.content, &tail.content) {
            (Some(a), Some(b)) => Some(format!("{a}{b}")),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };
        head.content = merged_content;
    }
    finalize(head);
    acc.with_data(data)
}

/// Materialize a finished aggregation run: clear `is_streaming` on the
/// merged message so it reads as a normal, complete message downstream.
pub fn finalize(message: &mut Message) {
    message.is_streaming = false;
}
