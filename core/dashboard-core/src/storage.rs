//! Storage configuration and path management for the dashboard.
//!
//! Every file the dashboard reads or writes is resolved here, relative to a
//! single home directory. Production code resolves the real home directory;
//! tests use `StorageConfig::with_home(temp_dir)` for isolation.
//!
//! ## Layout
//!
//! ```text
//! ~/.claude/
//!   projects-registry.json      registry (read/write)
//!   token-usage.json            token usage (read/write)
//!   dashboard/                  static UI, manifest, service worker, server logs
//!   second-brain/               knowledge base, daily/weekly syntheses
//!   scripts/                    guardian maintenance scripts
//!   logs/                       guardian state, pid and log files
//! ~/Documents/night-mission-report-*.md
//! ```

use std::path::{Path, PathBuf};

use crate::error::{DashboardError, Result};

pub const CLAUDE_DIR_NAME: &str = ".claude";
pub const HOME_OVERRIDE_ENV: &str = "DASHBOARD_HOME";

/// Knowledge domains under `second-brain/knowledge/`.
pub const KNOWLEDGE_DOMAINS: [&str; 3] = ["business", "technical", "personal"];

/// Central configuration for all dashboard paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// User home (default: `$DASHBOARD_HOME` or the OS home directory)
    home: PathBuf,
    /// Base directory for dashboard data (default: ~/.claude)
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves the home directory from `DASHBOARD_HOME`, falling back to the
    /// OS home directory.
    pub fn from_env() -> Result<Self> {
        if let Ok(value) = std::env::var(HOME_OVERRIDE_ENV) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Ok(Self::with_home(PathBuf::from(trimmed)));
            }
        }
        dirs::home_dir()
            .map(Self::with_home)
            .ok_or(DashboardError::HomeNotFound)
    }

    /// Creates a StorageConfig rooted at a custom home directory.
    pub fn with_home(home: PathBuf) -> Self {
        let root = home.join(CLAUDE_DIR_NAME);
        Self { home, root }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Returns the base directory (`~/.claude`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // State Files
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn registry_file(&self) -> PathBuf {
        self.root.join("projects-registry.json")
    }

    pub fn token_usage_file(&self) -> PathBuf {
        self.root.join("token-usage.json")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Static UI
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn dashboard_dir(&self) -> PathBuf {
        self.root.join("dashboard")
    }

    pub fn dashboard_index(&self) -> PathBuf {
        self.dashboard_dir().join("index.html")
    }

    pub fn reports_index(&self) -> PathBuf {
        self.dashboard_dir().join("reports").join("index.html")
    }

    pub fn brain_index(&self) -> PathBuf {
        self.second_brain_dir().join("ui").join("index.html")
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.dashboard_dir().join("manifest.json")
    }

    pub fn service_worker_file(&self) -> PathBuf {
        self.dashboard_dir().join("sw.js")
    }

    /// Directory for the server's own rolling log files.
    pub fn server_log_dir(&self) -> PathBuf {
        self.dashboard_dir().join("logs")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Second Brain
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn second_brain_dir(&self) -> PathBuf {
        self.root.join("second-brain")
    }

    pub fn profile_dir(&self) -> PathBuf {
        self.second_brain_dir().join("profile")
    }

    pub fn knowledge_dir(&self, domain: &str) -> PathBuf {
        self.second_brain_dir().join("knowledge").join(domain)
    }

    pub fn braindumps_raw_dir(&self) -> PathBuf {
        self.second_brain_dir().join("braindumps").join("raw")
    }

    pub fn conversation_history_file(&self) -> PathBuf {
        self.knowledge_dir("personal").join("conversation-history.json")
    }

    pub fn creators_updates_file(&self) -> PathBuf {
        self.knowledge_dir("personal").join("creators-updates.json")
    }

    pub fn creators_tracking_file(&self) -> PathBuf {
        self.knowledge_dir("personal").join("creators-tracking.md")
    }

    pub fn auto_learn_report_file(&self) -> PathBuf {
        self.knowledge_dir("technical").join("auto-learn-report.md")
    }

    pub fn memories_file(&self) -> PathBuf {
        self.knowledge_dir("personal").join("claude-memories.md")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────────

    /// Night mission reports are written to the user's Documents folder.
    pub fn documents_dir(&self) -> PathBuf {
        self.home.join("Documents")
    }

    pub fn daily_dir(&self) -> PathBuf {
        self.second_brain_dir().join("daily")
    }

    pub fn weekly_dir(&self) -> PathBuf {
        self.second_brain_dir().join("weekly")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Guardian
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn guardian_state_file(&self) -> PathBuf {
        self.logs_dir().join("guardian-state.json")
    }

    pub fn guardian_pid_file(&self) -> PathBuf {
        self.logs_dir().join("guardian-pid.txt")
    }

    pub fn guardian_log_file(&self) -> PathBuf {
        self.logs_dir().join("session-guardian.log")
    }

    /// Folder opened by the `open-folder` action when none is given.
    pub fn default_projects_dir(&self) -> PathBuf {
        self.home.join("projects")
    }
}
