//! File-backed state documents: the project registry and the token usage log.
//!
//! Both documents are read and replaced wholesale. There is no per-field
//! patching and no merge on save.
//!
//! # Missing vs. Malformed
//!
//! - Missing or blank file → the document's empty default
//!   (`{"projects": []}` for the registry, `{}` for tokens)
//! - Malformed JSON → [`DashboardError::Json`]; the caller picks the fallback
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so readers (the UI, the change watcher, the
//! broadcaster) never observe a partially written document.

use std::io::Write;
use std::path::PathBuf;

use claude_dashboard_protocol::{LiveUpdate, Project, ProjectRegistry};
use fs_err as fs;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

use crate::error::{DashboardError, Result};
use crate::storage::StorageConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateDocument {
    Registry,
    TokenUsage,
}

impl StateDocument {
    pub const ALL: [StateDocument; 2] = [StateDocument::Registry, StateDocument::TokenUsage];

    pub fn label(&self) -> &'static str {
        match self {
            StateDocument::Registry => "registry",
            StateDocument::TokenUsage => "token usage",
        }
    }

    /// Value returned for a document that does not exist yet.
    pub fn empty(&self) -> Value {
        match self {
            StateDocument::Registry => json!({ "projects": [] }),
            StateDocument::TokenUsage => json!({}),
        }
    }
}

/// Reads and replaces the two state documents under the dashboard root.
#[derive(Debug, Clone)]
pub struct StateStore {
    storage: StorageConfig,
}

impl StateStore {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn path(&self, document: StateDocument) -> PathBuf {
        match document {
            StateDocument::Registry => self.storage.registry_file(),
            StateDocument::TokenUsage => self.storage.token_usage_file(),
        }
    }

    pub fn load(&self, document: StateDocument) -> Result<Value> {
        let path = self.path(document);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(document.empty()),
            Err(err) => {
                return Err(DashboardError::io(
                    format!("reading {} document", document.label()),
                    err,
                ))
            }
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Empty state file, using empty document");
            return Ok(document.empty());
        }

        serde_json::from_str(&content).map_err(|err| {
            DashboardError::json(format!("parsing {}", path.display()), err)
        })
    }

    pub fn save(&self, document: StateDocument, value: &Value) -> Result<()> {
        let path = self.path(document);
        let content = serde_json::to_string_pretty(value).map_err(|err| {
            DashboardError::json(format!("serializing {} document", document.label()), err)
        })?;

        let parent_dir = path.parent().ok_or_else(|| {
            DashboardError::io(
                format!("{} has no parent directory", path.display()),
                std::io::Error::from(std::io::ErrorKind::InvalidInput),
            )
        })?;
        fs::create_dir_all(parent_dir)
            .map_err(|err| DashboardError::io("creating state directory", err))?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .map_err(|err| DashboardError::io("creating temp state file", err))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|err| DashboardError::io("writing temp state file", err))?;
        temp_file
            .flush()
            .map_err(|err| DashboardError::io("flushing temp state file", err))?;
        temp_file
            .persist(&path)
            .map_err(|err| DashboardError::io(format!("replacing {}", path.display()), err.error))?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "State document saved");
        Ok(())
    }

    /// Typed view of the registry. Entries are decoded one at a time; an
    /// entry that is not a project object is skipped and the rest survive.
    pub fn load_registry(&self) -> Result<ProjectRegistry> {
        let Value::Object(mut document) = self.load(StateDocument::Registry)? else {
            tracing::warn!("Registry is not a JSON object, treating as empty");
            return Ok(ProjectRegistry::default());
        };

        let projects = match document.remove("projects") {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .enumerate()
                .filter_map(|(index, entry)| match serde_json::from_value::<Project>(entry) {
                    Ok(project) => Some(project),
                    Err(err) => {
                        tracing::warn!(index, error = %err, "Skipping malformed registry entry");
                        None
                    }
                })
                .collect(),
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                tracing::warn!("Registry `projects` is not an array, treating as empty");
                Vec::new()
            }
        };

        Ok(ProjectRegistry {
            projects,
            extra: document,
        })
    }

    /// Reads both documents in full and combines them into one live update.
    pub fn snapshot(&self) -> Result<LiveUpdate> {
        let registry = self.load(StateDocument::Registry)?;
        let tokens = self.load(StateDocument::TokenUsage)?;
        Ok(LiveUpdate::from_documents(&registry, tokens))
    }
}
