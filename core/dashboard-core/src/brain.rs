//! Second-brain readers behind `/api/brain/{endpoint}`.
//!
//! Every reader returns plain JSON and never fails: unreadable files are
//! logged and skipped, missing directories read as empty.

use std::path::Path;

use fs_err as fs;
use serde_json::{json, Map, Value};
use walkdir::WalkDir;

use crate::storage::{StorageConfig, KNOWLEDGE_DOMAINS};

const CLAUDE_MEM_PREFIX: &str = "claude-mem";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrainEndpoint<'a> {
    Profile,
    Knowledge,
    Conversations,
    Braindumps,
    Stats,
    Creators,
    Memories,
    /// Sub-path after `claude-mem/`, served by the sidecar proxy.
    ClaudeMem(&'a str),
    Unknown(&'a str),
}

impl<'a> BrainEndpoint<'a> {
    pub fn parse(endpoint: &'a str) -> Self {
        match endpoint {
            "profile" => BrainEndpoint::Profile,
            "knowledge" => BrainEndpoint::Knowledge,
            "conversations" => BrainEndpoint::Conversations,
            "braindumps" => BrainEndpoint::Braindumps,
            "stats" => BrainEndpoint::Stats,
            "creators" => BrainEndpoint::Creators,
            "memories" => BrainEndpoint::Memories,
            other => match other.strip_prefix(CLAUDE_MEM_PREFIX) {
                Some(rest) => BrainEndpoint::ClaudeMem(rest.strip_prefix('/').unwrap_or(rest)),
                None => BrainEndpoint::Unknown(other),
            },
        }
    }
}

/// Reads the local data for one endpoint. Sidecar and unknown endpoints
/// yield `{}`; the server routes `ClaudeMem` elsewhere before calling this.
pub fn read_brain(storage: &StorageConfig, endpoint: BrainEndpoint<'_>) -> Value {
    match endpoint {
        BrainEndpoint::Profile => read_profile(storage),
        BrainEndpoint::Knowledge => read_knowledge(storage),
        BrainEndpoint::Conversations => {
            read_json_file(&storage.conversation_history_file()).unwrap_or_else(|| json!({}))
        }
        BrainEndpoint::Braindumps => read_braindumps(storage),
        BrainEndpoint::Stats => read_stats(storage),
        BrainEndpoint::Creators => read_creators(storage),
        BrainEndpoint::Memories => read_memories(storage),
        BrainEndpoint::ClaudeMem(_) => json!({}),
        BrainEndpoint::Unknown(name) => {
            tracing::debug!(endpoint = name, "Unknown brain endpoint");
            json!({})
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Readers
// ═══════════════════════════════════════════════════════════════════════════════

pub fn read_profile(storage: &StorageConfig) -> Value {
    let mut data = Map::new();
    for (stem, path) in files_with_extension(&storage.profile_dir(), &["md"]) {
        if let Some(content) = read_text_file(&path) {
            data.insert(stem, Value::String(content));
        }
    }
    Value::Object(data)
}

/// `{business, technical, personal}`; markdown as strings, JSON parsed.
pub fn read_knowledge(storage: &StorageConfig) -> Value {
    let mut data = Map::new();
    for domain in KNOWLEDGE_DOMAINS {
        let mut entries = Map::new();
        for (stem, path) in files_with_extension(&storage.knowledge_dir(domain), &["md", "json"]) {
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            let value = if is_json {
                read_json_file(&path)
            } else {
                read_text_file(&path).map(Value::String)
            };
            if let Some(value) = value {
                entries.insert(stem, value);
            }
        }
        data.insert(domain.to_string(), Value::Object(entries));
    }
    Value::Object(data)
}

pub fn read_braindumps(storage: &StorageConfig) -> Value {
    let dumps: Vec<Value> = files_with_extension(&storage.braindumps_raw_dir(), &["md"])
        .into_iter()
        .filter_map(|(_, path)| {
            let content = read_text_file(&path)?;
            let file = path.file_name()?.to_string_lossy().to_string();
            Some(json!({ "file": file, "content": content }))
        })
        .collect();
    Value::Array(dumps)
}

/// Counters derived from the conversation history and directory sizes.
/// Missing or falsy counters read as 0.
pub fn read_stats(storage: &StorageConfig) -> Value {
    let history = read_json_file(&storage.conversation_history_file()).unwrap_or_else(|| json!({}));
    let export = history.get("claudeExport").cloned().unwrap_or_else(|| json!({}));

    json!({
        "profileFiles": count_entries(&storage.profile_dir()),
        "braindumps": count_entries(&storage.braindumps_raw_dir()),
        "chatgptConversations": or_zero(history.pointer("/chatgpt/total")),
        "claudeConversations": or_zero(history.pointer("/claude/totalConversations")),
        "claudeProjects": or_zero(history.pointer("/claude/totalProjects")),
        "claudeExportConversations": or_zero(export.get("total")),
        "claudeExportMessages": or_zero(export.get("totalMessages")),
        "claudeExportProjects": or_zero(export.get("projects")),
        "claudeExportTopics": export
            .get("topics")
            .filter(|topics| is_truthy(topics))
            .cloned()
            .unwrap_or_else(|| json!({})),
        "lastAnalysis": history
            .get("generatedAt")
            .filter(|generated| is_truthy(generated))
            .cloned()
            .unwrap_or(Value::Null),
    })
}

pub fn read_creators(storage: &StorageConfig) -> Value {
    let mut data = match read_json_file(&storage.creators_updates_file()) {
        Some(Value::Object(map)) => map,
        Some(_) => {
            tracing::warn!("creators-updates.json is not an object, ignoring");
            Map::new()
        }
        None => Map::new(),
    };

    if let Some(tracking) = read_text_file(&storage.creators_tracking_file()) {
        data.insert("tracking".to_string(), Value::String(tracking));
    }
    if let Some(report) = read_text_file(&storage.auto_learn_report_file()) {
        data.insert("autoLearnReport".to_string(), Value::String(report));
    }
    Value::Object(data)
}

pub fn read_memories(storage: &StorageConfig) -> Value {
    match read_text_file(&storage.memories_file()) {
        Some(content) => json!({ "content": content }),
        None => json!({}),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// `(stem, path)` for files directly in `dir` with one of `extensions`,
/// sorted by file name.
fn files_with_extension(dir: &Path, extensions: &[&str]) -> Vec<(String, std::path::PathBuf)> {
    if !dir.exists() {
        return Vec::new();
    }

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .filter_map(|e| {
            let stem = e.path().file_stem()?.to_string_lossy().to_string();
            Some((stem, e.into_path()))
        })
        .collect()
}

fn count_entries(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .count()
}

fn read_text_file(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read brain file");
            None
        }
    }
}

fn read_json_file(path: &Path) -> Option<Value> {
    let content = read_text_file(path)?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Malformed JSON in brain file");
            None
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn or_zero(value: Option<&Value>) -> Value {
    value
        .filter(|value| is_truthy(value))
        .cloned()
        .unwrap_or_else(|| json!(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, StorageConfig) {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_home(temp.path().to_path_buf());
        (temp, storage)
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_parse_endpoints() {
        assert_eq!(BrainEndpoint::parse("profile"), BrainEndpoint::Profile);
        assert_eq!(BrainEndpoint::parse("claude-mem"), BrainEndpoint::ClaudeMem(""));
        assert_eq!(
            BrainEndpoint::parse("claude-mem/timeline"),
            BrainEndpoint::ClaudeMem("timeline")
        );
        assert_eq!(BrainEndpoint::parse("nope"), BrainEndpoint::Unknown("nope"));
    }

    #[test]
    fn test_profile_keyed_by_stem() {
        let (_temp, storage) = setup();
        write(&storage.profile_dir().join("about.md"), "# About");
        write(&storage.profile_dir().join("ignored.txt"), "x");

        assert_eq!(read_profile(&storage), json!({ "about": "# About" }));
    }

    #[test]
    fn test_missing_dirs_read_as_empty() {
        let (_temp, storage) = setup();

        assert_eq!(read_profile(&storage), json!({}));
        assert_eq!(read_braindumps(&storage), json!([]));
        assert_eq!(
            read_knowledge(&storage),
            json!({ "business": {}, "technical": {}, "personal": {} })
        );
        assert_eq!(read_brain(&storage, BrainEndpoint::Conversations), json!({}));
        assert_eq!(read_memories(&storage), json!({}));
        assert_eq!(read_creators(&storage), json!({}));
    }

    #[test]
    fn test_knowledge_parses_json_and_skips_malformed() {
        let (_temp, storage) = setup();
        let technical = storage.knowledge_dir("technical");
        write(&technical.join("stack.md"), "rust");
        write(&technical.join("tools.json"), r#"{"editor": "vim"}"#);
        write(&technical.join("broken.json"), "{");

        let data = read_knowledge(&storage);

        assert_eq!(data["technical"]["stack"], "rust");
        assert_eq!(data["technical"]["tools"], json!({ "editor": "vim" }));
        assert!(data["technical"].get("broken").is_none());
    }

    #[test]
    fn test_braindumps_list_files() {
        let (_temp, storage) = setup();
        write(&storage.braindumps_raw_dir().join("b.md"), "second");
        write(&storage.braindumps_raw_dir().join("a.md"), "first");

        assert_eq!(
            read_braindumps(&storage),
            json!([
                { "file": "a.md", "content": "first" },
                { "file": "b.md", "content": "second" }
            ])
        );
    }

    #[test]
    fn test_stats_defaults_and_counts() {
        let (_temp, storage) = setup();
        write(&storage.profile_dir().join("a.md"), "a");
        write(&storage.profile_dir().join("b.txt"), "b");
        write(
            &storage.conversation_history_file(),
            r#"{"chatgpt": {"total": 12}, "claude": {"totalConversations": 0}, "claudeExport": {"total": 5, "topics": {"rust": 3}}, "generatedAt": "2024-03-01"}"#,
        );

        let stats = read_stats(&storage);

        assert_eq!(stats["profileFiles"], 2);
        assert_eq!(stats["braindumps"], 0);
        assert_eq!(stats["chatgptConversations"], 12);
        assert_eq!(stats["claudeConversations"], 0);
        assert_eq!(stats["claudeProjects"], 0);
        assert_eq!(stats["claudeExportConversations"], 5);
        assert_eq!(stats["claudeExportMessages"], 0);
        assert_eq!(stats["claudeExportTopics"], json!({ "rust": 3 }));
        assert_eq!(stats["lastAnalysis"], "2024-03-01");
    }

    #[test]
    fn test_stats_without_history() {
        let (_temp, storage) = setup();
        let stats = read_stats(&storage);

        assert_eq!(stats["claudeExportTopics"], json!({}));
        assert_eq!(stats["lastAnalysis"], Value::Null);
    }

    #[test]
    fn test_creators_merges_markdown() {
        let (_temp, storage) = setup();
        write(&storage.creators_updates_file(), r#"{"updates": [1, 2]}"#);
        write(&storage.creators_tracking_file(), "tracking");
        write(&storage.auto_learn_report_file(), "learned");

        assert_eq!(
            read_creators(&storage),
            json!({ "updates": [1, 2], "tracking": "tracking", "autoLearnReport": "learned" })
        );
    }

    #[test]
    fn test_memories_content() {
        let (_temp, storage) = setup();
        write(&storage.memories_file(), "remember this");

        assert_eq!(read_memories(&storage), json!({ "content": "remember this" }));
    }

    #[test]
    fn test_unknown_endpoint_is_empty_object() {
        let (_temp, storage) = setup();
        assert_eq!(read_brain(&storage, BrainEndpoint::parse("whatever")), json!({}));
    }
}
