//! # dashboard-core
//!
//! Core library for the Claude dashboard server: everything that touches the
//! filesystem lives here, the server crate only adds HTTP, WebSocket and
//! process plumbing on top.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. The server calls in from its handlers.
//! - **Graceful degradation**: Missing files return empty/default values, not errors.
//! - **Wholesale documents**: State files are replaced atomically, never patched.
//! - **Testable paths**: Every path goes through [`StorageConfig`], so tests run
//!   against a temp home.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dashboard_core::{StateStore, StateDocument, StorageConfig};
//!
//! let store = StateStore::new(StorageConfig::from_env()?);
//! let registry = store.load(StateDocument::Registry)?;
//! let snapshot = store.snapshot()?;
//! ```

pub mod access;
pub mod brain;
pub mod error;
pub mod guardian;
pub mod patterns;
pub mod reports;
pub mod sessions;
pub mod state_store;
pub mod storage;
pub mod types;

// Re-export commonly used items at crate root
pub use access::ReportAccessPolicy;
pub use brain::{read_brain, BrainEndpoint};
pub use error::{DashboardError, Result};
pub use guardian::read_guardian_status;
pub use reports::{list_reports, parse_daily_report, parse_mission_report, parse_progress_notes};
pub use sessions::aggregate_agent_sessions;
pub use state_store::{StateDocument, StateStore};
pub use storage::StorageConfig;
pub use types::*;
