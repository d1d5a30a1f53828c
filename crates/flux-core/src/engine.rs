//! Scheduler: drives every ready node to completion, fans out
//! concurrently across nodes while keeping each node single-flight, and
//! detects quiescence to know when a run is done.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::Stream;
use tokio::task::JoinSet;

use crate::aggregate::aggregate_output_events;
use crate::config::FlowConfig;
use crate::error::FluxError;
use crate::event::{Event, EventSink, InMemoryEventStore, TopicEvent};
use crate::invoke_context::InvokeContext;
use crate::message::Messages;
use crate::node::Node;
use crate::tracker::{NodeTracker, TrackerMetrics};

/// The consumer id the engine itself uses to drain the output topic.
/// Draining counts as an implicit commit: once an `OutputTopicEvent` has
/// been handed back to the caller, it's done, whether or not anything
/// else in the flow would otherwise have subscribed to it.
const ENGINE_OUTPUT_CONSUMER: &str = "__engine_output__";

struct NodeRuntime {
    node: Arc<Node>,
    in_flight: Arc<AtomicBool>,
}

/// A built, runnable flow: a fixed set of nodes wired through topics (see
/// `flux-agent::WorkflowBuilder`), an input and output topic, and an
/// event sink recording the full lifecycle trail.
pub struct WorkflowEngine {
    runtimes: Vec<NodeRuntime>,
    input_topic: Arc<crate::topic::Topic>,
    output_topic: Arc<crate::topic::Topic>,
    subscriber_counts: HashMap<String, usize>,
    sink: Arc<dyn EventSink>,
    config: FlowConfig,
    /// The tracker for whichever `invoke`/`invoke_stream` call is
    /// currently running, if any — `stop()` forces it without the
    /// caller needing a handle of its own.
    active_tracker: Mutex<Option<Arc<NodeTracker>>>,
    /// A snapshot of the most recently completed run's tracker, kept
    /// around after `active_tracker` is cleared so callers (mainly
    /// tests) can assert on commit accounting without needing their own
    /// handle into the scheduler.
    last_metrics: Mutex<Option<TrackerMetrics>>,
}

impl WorkflowEngine {
    pub fn new(
        nodes: Vec<Arc<Node>>,
        input_topic: Arc<crate::topic::Topic>,
        output_topic: Arc<crate::topic::Topic>,
        config: FlowConfig,
    ) -> Self {
        Self::with_sink(nodes, input_topic, output_topic, config, Arc::new(InMemoryEventStore::new()))
    }

    pub fn with_sink(
        nodes: Vec<Arc<Node>>,
        input_topic: Arc<crate::topic::Topic>,
        output_topic: Arc<crate::topic::Topic>,
        config: FlowConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let mut subscriber_counts: HashMap<String, usize> = HashMap::new();
        for node in &nodes {
            for topic in node.subscribed_topics() {
                *subscriber_counts.entry(topic.name.clone()).or_insert(0) += 1;
            }
        }
        // The engine itself is the sole subscriber draining the output topic.
        *subscriber_counts.entry(output_topic.name.clone()).or_insert(0) += 1;

        let runtimes = nodes
            .into_iter()
            .map(|node| NodeRuntime { node, in_flight: Arc::new(AtomicBool::new(false)) })
            .collect();

        Self {
            runtimes,
            input_topic,
            output_topic,
            subscriber_counts,
            sink,
            config,
            active_tracker: Mutex::new(None),
            last_metrics: Mutex::new(None),
        }
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Tracker snapshot from the most recently completed `invoke`/
    /// `invoke_stream` call, if any has completed yet. Mainly useful for
    /// asserting on commit accounting (e.g. `total_committed`) in tests.
    pub fn last_run_metrics(&self) -> Option<TrackerMetrics> {
        *self.last_metrics.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn subscriber_count(&self, topic_name: &str) -> usize {
        self.subscriber_counts.get(topic_name).copied().unwrap_or(0)
    }

    fn set_active_tracker(&self, tracker: Option<Arc<NodeTracker>>) {
        *self.active_tracker.lock().unwrap_or_else(|e| e.into_inner()) = tracker;
    }

    fn record_run_metrics(&self, tracker: &NodeTracker) {
        *self.last_metrics.lock().unwrap_or_else(|e| e.into_inner()) = Some(tracker.metrics());
    }

    /// Run one full invocation to completion and return the
    /// materialized (non-streaming) output.
    pub async fn invoke(
        &self,
        invoke_context: InvokeContext,
        input: Messages,
    ) -> Result<Messages, FluxError> {
        let tracker = Arc::new(NodeTracker::new());
        self.set_active_tracker(Some(tracker.clone()));
        let result = self.run_invoke(invoke_context, input, tracker.clone()).await;
        self.record_run_metrics(&tracker);
        self.set_active_tracker(None);
        result
    }

    /// Drive the flow and drain the output topic concurrently — draining
    /// is itself the implicit commit an `OutputTopicEvent` needs, so it
    /// can't wait until after `drive` returns: `drive` won't reach
    /// quiescence until the output topic's pending events are committed.
    async fn run_invoke(
        &self,
        invoke_context: InvokeContext,
        input: Messages,
        tracker: Arc<NodeTracker>,
    ) -> Result<Messages, FluxError> {
        self.publish_input(&invoke_context, input, &tracker)?;

        let mut drive = Box::pin(self.drive(&invoke_context, tracker.clone()));
        let mut collected = Vec::new();
        let mut drive_done = false;

        while !drive_done {
            tokio::select! {
                result = &mut drive => {
                    result?;
                    drive_done = true;
                }
                events = self.output_topic.fetch_async(ENGINE_OUTPUT_CONSUMER, Some(self.config.fetch_poll_timeout)) => {
                    self.drain_output_batch(events, &tracker, &mut collected);
                }
            }
        }

        tracker
            .wait_for_quiescence(self.config.quiescence_timeout)
            .await?;
        let remaining = self.output_topic.try_fetch(ENGINE_OUTPUT_CONSUMER);
        self.drain_output_batch(remaining, &tracker, &mut collected);

        let merged = aggregate_output_events(collected);
        Ok(merged.into_iter().flat_map(|e| e.data().clone()).collect())
    }

    fn drain_output_batch(
        &self,
        events: Vec<TopicEvent>,
        tracker: &NodeTracker,
        collected: &mut Vec<TopicEvent>,
    ) {
        if let Some(last) = events.last() {
            self.output_topic.commit(ENGINE_OUTPUT_CONSUMER, last.offset());
        }
        tracker.on_committed(events.len() as u64);
        collected.extend(events);
    }

    /// Run to completion, but surface output-topic events as they land
    /// rather than waiting for quiescence and aggregating. Fragments are
    /// forwarded exactly as published — no aggregation happens on this
    /// path, since the caller wants them live.
    pub fn invoke_stream(
        &self,
        invoke_context: InvokeContext,
        input: Messages,
    ) -> impl Stream<Item = Result<TopicEvent, FluxError>> + '_ {
        async_stream::try_stream! {
            let tracker = Arc::new(NodeTracker::new());
            self.set_active_tracker(Some(tracker.clone()));
            self.publish_input(&invoke_context, input, &tracker)?;

            let mut drive = Box::pin(self.drive(&invoke_context, tracker.clone()));
            let mut drive_done = false;

            while !drive_done {
                tokio::select! {
                    result = &mut drive => {
                        result?;
                        drive_done = true;
                    }
                    events = self.output_topic.fetch_async(ENGINE_OUTPUT_CONSUMER, Some(self.config.fetch_poll_timeout)) => {
                        let mut batch = Vec::new();
                        self.drain_output_batch(events, &tracker, &mut batch);
                        for event in batch {
                            yield event;
                        }
                    }
                }
            }

            let quiescence_result = tracker.wait_for_quiescence(self.config.quiescence_timeout).await;
            let remaining = self.output_topic.try_fetch(ENGINE_OUTPUT_CONSUMER);
            let mut trailing = Vec::new();
            self.drain_output_batch(remaining, &tracker, &mut trailing);
            self.record_run_metrics(&tracker);
            self.set_active_tracker(None);
            for event in trailing {
                yield event;
            }
            quiescence_result?;
        }
    }

    /// Force every in-flight and future scheduling to stop immediately,
    /// regardless of quiescence. The currently active `invoke`/
    /// `invoke_stream` call returns as soon as its current node step
    /// finishes. A no-op if nothing is running.
    pub fn stop(&self) {
        if let Some(tracker) = self.active_tracker.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            tracker.force_stop();
        }
    }

    fn publish_input(
        &self,
        invoke_context: &InvokeContext,
        input: Messages,
        tracker: &NodeTracker,
    ) -> Result<(), FluxError> {
        if !self.input_topic.accepts(&input) {
            return Err(FluxError::ConditionReject(self.input_topic.name.clone()));
        }
        let event = self.input_topic.publish(invoke_context, "external", input, vec![]);
        self.sink.record(Event::Topic(event.clone()));
        tracker.on_published(self.subscriber_count(event.topic_name()) as u64);
        Ok(())
    }

    async fn drive(&self, invoke_context: &InvokeContext, tracker: Arc<NodeTracker>) -> Result<(), FluxError> {
        let mut tasks: JoinSet<Result<(String, crate::node::NodeInvokeOutcome), (String, FluxError)>> =
            JoinSet::new();

        loop {
            let mut spawned_any = false;
            for runtime in &self.runtimes {
                if tracker.should_terminate() {
                    break;
                }
                if !runtime.node.is_ready() {
                    continue;
                }
                if runtime.in_flight.swap(true, Ordering::AcqRel) {
                    continue;
                }
                spawned_any = true;
                let node = runtime.node.clone();
                let in_flight = runtime.in_flight.clone();
                let ctx = invoke_context.clone();
                let sink = self.sink.clone();
                let tracker = tracker.clone();
                let name = node.name.clone();
                tracker.enter(&name);
                tasks.spawn(async move {
                    let result = node.invoke(&ctx, sink.as_ref()).await;
                    in_flight.store(false, Ordering::Release);
                    result.map(|outcome| (name.clone(), outcome)).map_err(|e| (name, e))
                });
            }

            if tracker.should_terminate() {
                if tasks.is_empty() {
                    return Ok(());
                }
                // `force_stop()` was called while a node invocation was
                // still in flight: don't wait for it to finish (it may
                // never, if the tool hangs) — abort it and return. Its
                // consumed offsets were never committed, matching the
                // "no further delivery, no in-flight commit" guarantee.
                // Every node's flight flag is reset so the next
                // `invoke`/`invoke_stream` call can schedule it again.
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                for runtime in &self.runtimes {
                    runtime.in_flight.store(false, Ordering::Release);
                }
                return Ok(());
            }

            if tasks.is_empty() {
                if !spawned_any {
                    tokio::time::sleep(self.config.fetch_poll_timeout.min(Duration::from_millis(25)))
                        .await;
                }
                continue;
            }

            if let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok((name, outcome))) => {
                        tracker.leave(&name);
                        let published_units: u64 = outcome
                            .published
                            .iter()
                            .map(|e| self.subscriber_count(e.topic_name()) as u64)
                            .sum();
                        tracker.on_published(published_units);
                        tracker.on_committed(outcome.consumed_count as u64);
                    }
                    Ok(Err((name, err))) => {
                        tracker.leave(&name);
                        return Err(err);
                    }
                    Err(join_err) => {
                        return Err(FluxError::Other(format!("node task panicked: {join_err}")));
                    }
                }
            }
        }
    }
}
