//! Response types produced by the report and session readers.
//!
//! Field names are camelCase on the wire; the dashboard UI reads them as-is.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// Report Index
// ═══════════════════════════════════════════════════════════════════════════════

/// One report file in the index returned by `/api/reports/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub date: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportIndex {
    pub missions: Vec<ReportEntry>,
    pub daily: Vec<ReportEntry>,
    pub weekly: Vec<ReportEntry>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Parsed Reports
// ═══════════════════════════════════════════════════════════════════════════════

/// A row of the agent table in a night mission report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRow {
    pub num: String,
    pub project: String,
    pub task: String,
    pub agent_id: String,
    pub status: String,
}

/// Everything extracted from one night mission report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionSummary {
    pub agents: Vec<AgentRow>,
    pub success_count: usize,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProject {
    pub name: String,
    pub status: String,
}

/// Sections of a project's PROGRESS.md.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressNotes {
    pub last_updated: Option<String>,
    pub current_state: String,
    pub what_was_done: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Session Timeline
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSession {
    pub date: String,
    pub file: String,
    pub agents: Vec<AgentRow>,
    pub agent_count: usize,
    pub success_count: usize,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_projects: Option<Vec<DailyProject>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySession {
    pub date: String,
    pub file: String,
    pub projects: Vec<DailyProject>,
    pub project_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AgentSession {
    Mission(MissionSession),
    Daily(DailySession),
}

impl AgentSession {
    pub fn date(&self) -> &str {
        match self {
            AgentSession::Mission(session) => &session.date,
            AgentSession::Daily(session) => &session.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub project_id: String,
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub current_state: String,
    pub what_was_done: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_missions: usize,
    pub total_agents: usize,
    pub total_success: usize,
}

/// Response of `/api/agent-sessions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSessions {
    pub sessions: Vec<AgentSession>,
    pub last_mission: Option<AgentSession>,
    pub stats: SessionStats,
    pub progress_updates: Vec<ProgressUpdate>,
}
