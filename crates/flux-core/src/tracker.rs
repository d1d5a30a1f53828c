//! Quiescence detection for the workflow scheduler: when has every node
//! finished and every publish been drained, so `invoke`/`invoke_stream`
//! can return?

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::FluxError;

#[derive(Default)]
struct TrackerState {
    active: HashSet<String>,
    uncommitted: i64,
    total_committed: u64,
    has_started: bool,
    forced: bool,
}

/// Snapshot for introspection/tests — not consumed by the scheduler
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerMetrics {
    pub active_count: usize,
    pub uncommitted: i64,
    pub total_committed: u64,
    pub has_started: bool,
    pub forced: bool,
}

/// Tracks in-flight node activity across a single `invoke`/`invoke_stream`
/// run. A run is quiescent once:
///
/// `active.is_empty() && uncommitted == 0 && has_started && total_committed > 0`
///
/// All four conditions matter: `has_started` rules out the trivially
/// quiescent state before any node has ever run, and `total_committed >
/// 0` rules out a run that finished without ever publishing anything
/// consumable.
pub struct NodeTracker {
    state: Mutex<TrackerState>,
    quiescent: Notify,
}

impl Default for NodeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            quiescent: Notify::new(),
        }
    }

    /// A node begins processing.
    pub fn enter(&self, node_name: &str) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.has_started = true;
        state.active.insert(node_name.to_string());
    }

    /// A node finishes processing (success or failure alike — failure
    /// propagates separately, this only tracks activity).
    pub fn leave(&self, node_name: &str) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.active.remove(node_name);
        self.notify_if_quiescent(&state);
    }

    /// A node published `count` events that haven't been committed yet.
    pub fn on_published(&self, count: u64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.uncommitted += count as i64;
    }

    /// `count` previously-published events were drained/committed.
    pub fn on_committed(&self, count: u64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.uncommitted -= count as i64;
        state.total_committed += count;
        self.notify_if_quiescent(&state);
    }

    fn notify_if_quiescent(&self, state: &TrackerState) {
        if Self::quiescent_locked(state) {
            self.quiescent.notify_waiters();
        }
    }

    fn quiescent_locked(state: &TrackerState) -> bool {
        state.active.is_empty()
            && state.uncommitted == 0
            && state.has_started
            && state.total_committed > 0
    }

    pub fn is_quiescent(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Self::quiescent_locked(&state)
    }

    /// Quiescent, or an external caller forced this run to stop.
    pub fn should_terminate(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Self::quiescent_locked(&state) || state.forced
    }

    /// Force this run to terminate regardless of in-flight activity —
    /// `WorkflowEngine::stop`.
    pub fn force_stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.forced = true;
        drop(state);
        self.quiescent.notify_waiters();
    }

    /// Block until `should_terminate()`, or time out.
    pub async fn wait_for_quiescence(&self, timeout: Option<Duration>) -> Result<(), FluxError> {
        loop {
            let notified = self.quiescent.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.should_terminate() {
                return Ok(());
            }

            match timeout {
                Some(d) => {
                    if tokio::time::timeout(d, notified).await.is_err() {
                        return Err(FluxError::QuiescenceTimeout(d));
                    }
                }
                None => notified.await,
            }
        }
    }

    pub fn metrics(&self) -> TrackerMetrics {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        TrackerMetrics {
            active_count: state.active.len(),
            uncommitted: state.uncommitted,
            total_committed: state.total_committed,
            has_started: state.has_started,
            forced: state.forced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_is_not_quiescent() {
        let tracker = NodeTracker::new();
        assert!(!tracker.is_quiescent());
    }

    #[test]
    fn quiescent_only_after_start_publish_and_drain() {
        let tracker = NodeTracker::new();
        tracker.enter("n1");
        assert!(!tracker.is_quiescent());

        tracker.on_published(1);
        tracker.leave("n1");
        // Published but not committed yet: not quiescent.
        assert!(!tracker.is_quiescent());

        tracker.on_committed(1);
        assert!(tracker.is_quiescent());
    }

    #[test]
    fn active_node_blocks_quiescence_even_if_committed() {
        let tracker = NodeTracker::new();
        tracker.enter("n1");
        tracker.on_published(1);
        tracker.on_committed(1);
        // n1 is still active.
        assert!(!tracker.is_quiescent());
        tracker.leave("n1");
        assert!(tracker.is_quiescent());
    }

    #[test]
    fn force_stop_sets_should_terminate_without_quiescence() {
        let tracker = NodeTracker::new();
        tracker.enter("n1");
        assert!(!tracker.should_terminate());
        tracker.force_stop();
        assert!(tracker.should_terminate());
        assert!(!tracker.is_quiescent());
    }

    #[tokio::test]
    async fn wait_for_quiescence_times_out() {
        let tracker = NodeTracker::new();
        tracker.enter("n1");
        let result = tracker.wait_for_quiescence(Some(Duration::from_millis(20))).await;
        assert!(matches!(result, Err(FluxError::QuiescenceTimeout(_))));
    }

    #[tokio::test]
    async fn wait_for_quiescence_resolves_once_quiescent() {
        let tracker = std::sync::Arc::new(NodeTracker::new());
        tracker.enter("n1");
        tracker.on_published(1);

        let waiter_tracker = tracker.clone();
        let waiter = tokio::spawn(async move {
            waiter_tracker
                .wait_for_quiescence(Some(Duration::from_secs(2)))
                .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tracker.leave("n1");
        tracker.on_committed(1);

        assert!(waiter.await.unwrap().is_ok());
    }

    #[test]
    fn metrics_reflect_activity() {
        let tracker = NodeTracker::new();
        tracker.enter("n1");
        tracker.on_published(2);
        let snap = tracker.metrics();
        assert_eq!(snap.active_count, 1);
        assert_eq!(snap.uncommitted, 2);
        assert!(snap.has_started);
        assert!(!snap.forced);
    }
}
