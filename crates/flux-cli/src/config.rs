//! Loads the engine's `FlowConfig` from the environment for the CLI
//! binary, the same way `flux-core`'s own env lookup works — this module
//! only adds `.env` loading at the process entry point, matching the
//! teacher's split between library config and its CLI-side `dotenvy`
//! bootstrap.

use flux_core::FlowConfig;

/// Load `.env` (if present) and build a `FlowConfig` from the process
/// environment.
pub fn load() -> FlowConfig {
    flux_core::config::load_dotenv();
    FlowConfig::from_env()
}
