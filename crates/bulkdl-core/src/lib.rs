pub mod config;
pub mod error;
pub mod logging;

// Pipeline, leaves first: links → url_model → plan → transport/fetcher → progress → orchestrator.
pub mod fetcher;
pub mod links;
pub mod orchestrator;
pub mod plan;
pub mod progress;
pub mod storage;
pub mod transport;
pub mod url_model;

pub use config::{BulkConfig, Overrides, RunSettings};
pub use error::{FetchError, PlanError, RunError, TaskError};
pub use orchestrator::{Orchestrator, RunReport};
pub use progress::ProgressStats;
pub use transport::{HttpTransport, ReqwestTransport, TransportOptions};
