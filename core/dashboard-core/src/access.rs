//! Allow-list check for report files requested by path.
//!
//! `/api/reports/content?file=` takes an absolute path from the client. Only
//! markdown files under the report directories may be read. The check runs
//! twice: lexically on the requested path, then again on the canonical path so
//! a symlink inside an allowed directory cannot point outside of it.

use std::path::{Component, Path, PathBuf};

use fs_err as fs;

use crate::error::{DashboardError, Result};
use crate::storage::StorageConfig;

pub const REPORT_EXTENSION: &str = "md";

#[derive(Debug, Clone)]
pub struct ReportAccessPolicy {
    roots: Vec<PathBuf>,
}

impl ReportAccessPolicy {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Documents (night missions), daily and weekly synthesis directories.
    pub fn for_storage(storage: &StorageConfig) -> Self {
        Self::new(vec![
            storage.documents_dir(),
            storage.daily_dir(),
            storage.weekly_dir(),
        ])
    }

    /// Resolves a requested path to the canonical file it names.
    ///
    /// Returns [`DashboardError::AccessDenied`] for anything outside the
    /// allow-list and [`DashboardError::FileNotFound`] when an allowed path
    /// does not exist.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf> {
        let requested_path = Path::new(requested);
        if !requested_path.is_absolute() {
            return Err(DashboardError::access_denied(requested_path, "path is not absolute"));
        }

        let normalized = normalize_lexically(requested_path);
        let is_markdown = normalized
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == REPORT_EXTENSION);
        if !is_markdown {
            return Err(DashboardError::access_denied(normalized, "not a markdown file"));
        }

        if !self.roots.iter().any(|root| normalized.starts_with(normalize_lexically(root))) {
            return Err(DashboardError::access_denied(normalized, "outside report directories"));
        }

        let canonical = match fs::canonicalize(&normalized) {
            Ok(path) => path,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(DashboardError::FileNotFound(normalized));
            }
            Err(err) => return Err(DashboardError::io("resolving report path", err)),
        };

        let inside_canonical_root = self
            .roots
            .iter()
            .filter_map(|root| std::fs::canonicalize(root).ok())
            .any(|root| canonical.starts_with(root));
        if !inside_canonical_root {
            return Err(DashboardError::access_denied(canonical, "resolves outside report directories"));
        }

        if !canonical.is_file() {
            return Err(DashboardError::FileNotFound(canonical));
        }

        Ok(canonical)
    }

    pub fn read_report(&self, requested: &str) -> Result<String> {
        let path = self.resolve(requested)?;
        fs::read_to_string(&path).map_err(|err| DashboardError::io("reading report", err))
    }
}

/// Collapses `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
