//! Wire types shared by the dashboard server and its UI clients.
//!
//! This crate keeps the JSON shapes of the registry, the live-update snapshot
//! and the POST bodies in one place so the server and any Rust client agree on
//! them. The server remains the authority on validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_HTTP_PORT: u16 = 3456;
pub const DEFAULT_WS_PORT: u16 = 3457;
pub const DEFAULT_SIDECAR_URL: &str = "http://127.0.0.1:37777";
pub const SIDECAR_TIMEOUT_SECS: u64 = 5;
pub const ACTION_TIMEOUT_SECS: u64 = 30;
pub const MAX_REQUEST_BYTES: usize = 8 * 1024 * 1024; // 8MB

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// One tracked project as stored in `projects-registry.json`.
///
/// Keys the dashboard does not know about are kept in `extra` so a
/// load/save cycle never drops data written by the UI. Known fields decode
/// leniently: the UI is the only writer and its types are not enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "lenient::scalar_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::scalar_string")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "lenient::scalar_string")]
    pub status: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub folder: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_session: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    /// Terminal statuses are excluded from recent-progress aggregation.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "merged" | "paused")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRegistry {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Numbers and booleans are stringified; null, arrays and objects are empty.
    pub fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => String::new(),
        })
    }

    /// Only strings are kept.
    pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Some(text),
            _ => None,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Live updates
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveUpdateKind {
    Update,
}

/// Snapshot pushed to every live client: `{"type":"update","projects":[..],"tokens":{..}}`.
///
/// `projects` and `tokens` are carried verbatim from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveUpdate {
    #[serde(rename = "type")]
    pub kind: LiveUpdateKind,
    pub projects: Vec<Value>,
    pub tokens: Value,
}

impl LiveUpdate {
    pub fn new(projects: Vec<Value>, tokens: Value) -> Self {
        Self {
            kind: LiveUpdateKind::Update,
            projects,
            tokens,
        }
    }

    /// Builds a snapshot from the raw registry and token documents.
    pub fn from_documents(registry: &Value, tokens: Value) -> Self {
        let projects = registry
            .get("projects")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let tokens = if tokens.is_null() {
            Value::Object(Map::new())
        } else {
            tokens
        };
        Self::new(projects, tokens)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request bodies
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub command: String,
}

/// `action` is kept as raw JSON so a missing or non-string value still gets
/// the `Unknown action` answer instead of a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianActionRequest {
    #[serde(default)]
    pub action: Value,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub folder: Option<String>,
}

impl GuardianActionRequest {
    pub fn parse_action(&self) -> Result<GuardianAction, UnknownAction> {
        match &self.action {
            Value::String(name) => name.parse(),
            Value::Null => Err(UnknownAction("undefined".to_string())),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Maintenance actions the guardian panel can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardianAction {
    Optimize,
    KillZombies,
    Cleanup,
    KillAll,
    LaunchDaily,
    LaunchWeekly,
    RestartGuardian,
    OpenFolder,
    OpenClaude,
}

impl GuardianAction {
    pub const ALL: [GuardianAction; 9] = [
        GuardianAction::Optimize,
        GuardianAction::KillZombies,
        GuardianAction::Cleanup,
        GuardianAction::KillAll,
        GuardianAction::LaunchDaily,
        GuardianAction::LaunchWeekly,
        GuardianAction::RestartGuardian,
        GuardianAction::OpenFolder,
        GuardianAction::OpenClaude,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GuardianAction::Optimize => "optimize",
            GuardianAction::KillZombies => "kill-zombies",
            GuardianAction::Cleanup => "cleanup",
            GuardianAction::KillAll => "kill-all",
            GuardianAction::LaunchDaily => "launch-daily",
            GuardianAction::LaunchWeekly => "launch-weekly",
            GuardianAction::RestartGuardian => "restart-guardian",
            GuardianAction::OpenFolder => "open-folder",
            GuardianAction::OpenClaude => "open-claude",
        }
    }
}

impl fmt::Display for GuardianAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown action: {}", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for GuardianAction {
    type Err = UnknownAction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GuardianAction::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| UnknownAction(value.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Response envelopes
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            action: None,
        }
    }

    pub fn for_action(action: GuardianAction) -> Self {
        Self {
            success: true,
            action: Some(action.as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
