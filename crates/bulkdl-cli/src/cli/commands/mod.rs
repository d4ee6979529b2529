//! CLI command handlers, one per file.

mod config;
mod fetch;
mod plan;

use anyhow::Result;
use bulkdl_core::config::RunSettings;
use bulkdl_core::transport::{ReqwestTransport, TransportOptions};
use bulkdl_core::Orchestrator;
use std::sync::Arc;

pub use config::run_show_config;
pub use fetch::run_fetch;
pub use plan::run_plan;

/// Orchestrator over the reqwest transport, tuned from `settings`.
fn build_orchestrator(settings: RunSettings) -> Result<Orchestrator> {
    let transport = ReqwestTransport::new(&TransportOptions {
        request_timeout: settings.request_timeout,
        user_agent: settings.user_agent.clone(),
        ..TransportOptions::default()
    })?;
    Ok(Orchestrator::new(settings, Arc::new(transport)))
}
