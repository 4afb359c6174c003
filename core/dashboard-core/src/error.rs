//! Error types for dashboard-core operations.

use std::path::PathBuf;

/// All errors that can occur in dashboard-core operations.
///
/// Most readers in this crate degrade to empty values instead of returning
/// these; the variants surface where the caller has to pick a status code or
/// a fallback (state documents, report access).
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeNotFound,

    // ─────────────────────────────────────────────────────────────────────
    // Access Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Access denied: {path}: {reason}")]
    AccessDenied { path: PathBuf, reason: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DashboardError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        DashboardError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        DashboardError::Json {
            context: context.into(),
            source,
        }
    }

    pub fn access_denied(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DashboardError::AccessDenied {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results using DashboardError.
pub type Result<T> = std::result::Result<T, DashboardError>;
