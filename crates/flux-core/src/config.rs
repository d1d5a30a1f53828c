use std::env;
use std::time::Duration;

/// Load `.env` (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_ms(profile: &str, key: &str, default_ms: u64) -> Duration {
    let ms = profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

/// Runtime configuration for the workflow engine.
///
/// Loaded from environment variables. Profile is read from `FLUX_PROFILE`
/// (e.g. `CI`); when set, every key is first looked up as
/// `{PROFILE}_{KEY}`, falling back to the unprefixed `{KEY}`.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub profile: String,
    /// Default timeout for `TopicEventQueue::fetch_async` when a node has
    /// no ready subscription and the scheduler is waiting for new data.
    pub fetch_poll_timeout: Duration,
    /// Default timeout for `WorkflowEngine::invoke`'s
    /// `wait_for_quiescence` call, unless overridden per-call.
    pub quiescence_timeout: Option<Duration>,
    /// Soft warning threshold for a single topic's log length — logged,
    /// never enforced as backpressure.
    pub log_warning_size: usize,
}

impl FlowConfig {
    pub fn from_env() -> Self {
        let profile = env::var("FLUX_PROFILE").unwrap_or_default().to_uppercase();
        Self::for_profile(&profile)
    }

    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let quiescence_ms: Option<u64> =
            profiled_env_opt(p, "QUIESCENCE_TIMEOUT_MS").and_then(|v| v.parse().ok());
        Self {
            profile: p.to_string(),
            fetch_poll_timeout: profiled_env_ms(p, "FETCH_POLL_TIMEOUT_MS", 1000),
            quiescence_timeout: quiescence_ms.map(Duration::from_millis),
            log_warning_size: profiled_env_or(p, "LOG_WARNING_SIZE", "1000")
                .parse()
                .unwrap_or(1000),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    pub fn log_summary(&self) {
        tracing::info!(
            profile = %self.profile_label(),
            fetch_poll_timeout_ms = self.fetch_poll_timeout.as_millis() as u64,
            quiescence_timeout_ms = self.quiescence_timeout.map(|d| d.as_millis() as u64),
            "flow config loaded",
        );
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::for_profile("")
    }
}
