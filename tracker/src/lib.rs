//! Posts e2e test results as comments on Jira tickets.
//!
//! ```text
//! Reporter::observe / Reporter::around
//!     ├── runs the test (value, error or panic)
//!     ├── Resolver::resolve(key)     DirectLookup -> KeySearch
//!     └── comment::post(issue)       fixed template, one comment per run
//! ```
//!
//! Failures anywhere on the reporting path are logged and swallowed; the
//! test's own result always reaches the caller untouched.

pub mod check;
pub mod client;
pub mod comment;
pub mod config;
pub mod error;
pub mod reporter;
pub mod resolver;

pub use client::{Issue, JiraClient, Tracker};
pub use config::TrackerConfig;
pub use error::{ApiError, ConfigError, NotFound, ReportError, ReportResult};
pub use reporter::{Around, Reporter, TestRun};
pub use resolver::Resolver;

/// Installs the `RUST_LOG`-driven fmt subscriber, defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
