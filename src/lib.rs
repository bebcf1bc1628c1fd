//! Web Vision - single-shot web component capture and validation.
//!
//! This crate provides:
//! - One-invocation workflow orchestration with guaranteed browser teardown
//! - Headless Chrome page driving behind a capability trait (stub included)
//! - Element-scoped screenshot capture uploaded to object storage
//! - A fixed battery of isolated sub-element validation checks
//! - A structured JSON run report with per-step outcomes and timings
//!
//! # Example
//!
//! ```rust,no_run
//! use web_vision::browser::ChromeLauncher;
//! use web_vision::config::Config;
//! use web_vision::store::HttpObjectStore;
//!
//! # async fn example() {
//! let config = Config::from_env();
//! let launcher = ChromeLauncher::new();
//! let store = HttpObjectStore::new(&config.storage.region, &config.storage.bucket);
//! let response = web_vision::runner::run(
//!     &config,
//!     &launcher,
//!     &store,
//!     serde_json::json!({}),
//! )
//! .await;
//! println!("{}", response.body);
//! # }
//! ```

pub mod browser;
pub mod checks;
pub mod config;
pub mod report;
pub mod runner;
pub mod scratch;
pub mod store;

// Re-export report types
pub use report::{InvocationResponse, RunReport, StepResult, StepStatus};

// Re-export the orchestrator entry point and error taxonomy
pub use runner::{FatalError, run};

// Re-export browser capability types
pub use browser::{
    BrowserError, BrowserLauncher, BrowserResult, BrowserSession, ChromeLauncher, ElementProbe,
    SessionConfig, StubLauncher, StubScript,
};

// Re-export storage capability types
pub use store::{ArtifactStore, HttpObjectStore, MemoryStore, StoreError, artifact_key};

// Re-export the validation battery
pub use checks::{BATTERY, BATTERY_COMPLETE_STEP, Check, CheckKind, run_battery};
