//! Report discovery and markdown scraping.
//!
//! Report files are produced by external jobs and follow a
//! `<prefix>YYYY-MM-DD.md` naming convention. Parsing is pattern-based and
//! never fails: missing sections and malformed rows degrade to empty fields.

use std::path::Path;

use fs_err as fs;

use crate::patterns::*;
use crate::storage::StorageConfig;
use crate::types::{AgentRow, DailyProject, MissionSummary, ProgressNotes, ReportEntry, ReportIndex};

const CURRENT_STATE_MAX_CHARS: usize = 300;
const WHAT_WAS_DONE_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Mission,
    Daily,
    Weekly,
}

impl ReportKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ReportKind::Mission => "night-mission-report-",
            ReportKind::Daily => "daily-",
            ReportKind::Weekly => "synthesis-",
        }
    }

    /// Display label that replaces the prefix in the index.
    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Mission => "משימת לילה ",
            ReportKind::Daily => "סיכום יומי ",
            ReportKind::Weekly => "סינתזה שבועית ",
        }
    }

    pub fn dir(&self, storage: &StorageConfig) -> std::path::PathBuf {
        match self {
            ReportKind::Mission => storage.documents_dir(),
            ReportKind::Daily => storage.daily_dir(),
            ReportKind::Weekly => storage.weekly_dir(),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        file_name.starts_with(self.prefix()) && file_name.ends_with(".md")
    }
}

/// Returns the first `YYYY-MM-DD` in a file name, or an empty string.
pub fn date_from_file_name(file_name: &str) -> String {
    RE_REPORT_DATE
        .captures(file_name)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// File names of one report kind, newest first by name.
///
/// A missing directory yields an empty list.
pub fn report_files(dir: &Path, kind: ReportKind) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, dir = %dir.display(), "Failed to list report directory");
            }
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| kind.matches(name))
        .collect();
    names.sort();
    names.reverse();
    names
}

fn list_kind(storage: &StorageConfig, kind: ReportKind) -> Vec<ReportEntry> {
    let dir = kind.dir(storage);
    let mut entries: Vec<ReportEntry> = report_files(&dir, kind)
        .into_iter()
        .map(|file_name| {
            let stem = file_name.strip_suffix(".md").unwrap_or(&file_name);
            let name = stem.replacen(kind.prefix(), kind.label(), 1);
            ReportEntry {
                name,
                date: date_from_file_name(&file_name),
                path: dir.join(&file_name).to_string_lossy().to_string(),
            }
        })
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

/// Index of all mission, daily and weekly reports, each sorted by date descending.
pub fn list_reports(storage: &StorageConfig) -> ReportIndex {
    ReportIndex {
        missions: list_kind(storage, ReportKind::Mission),
        daily: list_kind(storage, ReportKind::Daily),
        weekly: list_kind(storage, ReportKind::Weekly),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Parsers
// ═══════════════════════════════════════════════════════════════════════════════

/// Extracts the agent table, success count and executive summary of a
/// night mission report.
pub fn parse_mission_report(content: &str) -> MissionSummary {
    let agents: Vec<AgentRow> = RE_MISSION_TABLE_ROW
        .find_iter(content)
        .filter_map(|row| parse_agent_row(row.as_str()))
        .collect();

    let success_count = agents
        .iter()
        .filter(|agent| RE_SUCCESS_STATUS.is_match(&agent.status))
        .count();

    let summary = section_body(content, MISSION_SUMMARY_HEADING, &["\n---", "\n##"], false)
        .map(|body| body.trim().to_string())
        .unwrap_or_default();

    MissionSummary {
        agents,
        success_count,
        summary,
    }
}

fn parse_agent_row(row: &str) -> Option<AgentRow> {
    let cols: Vec<&str> = row
        .split('|')
        .map(str::trim)
        .filter(|col| !col.is_empty())
        .collect();

    if cols.len() < 5
        || cols[0].contains("---")
        || !RE_AGENT_NUMBER.is_match(cols[0])
        || !RE_AGENT_ID.is_match(cols[3])
    {
        return None;
    }

    Some(AgentRow {
        num: cols[0].to_string(),
        project: cols[1].to_string(),
        task: cols[2].to_string(),
        agent_id: cols[3].to_string(),
        status: cols[4].to_string(),
    })
}

/// Extracts `- … **name** … (status)` project lines from a daily synthesis.
pub fn parse_daily_report(content: &str) -> Vec<DailyProject> {
    RE_DAILY_PROJECT_LINE
        .find_iter(content)
        .map(|line| {
            let line = line.as_str();
            DailyProject {
                name: RE_BOLD_NAME
                    .captures(line)
                    .map(|caps| caps[1].to_string())
                    .unwrap_or_default(),
                status: RE_PAREN_STATUS
                    .captures(line)
                    .map(|caps| caps[1].to_string())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

/// Extracts the `Last Updated:` line and the current-state / what-was-done
/// sections of a PROGRESS.md file, truncated for display.
pub fn parse_progress_notes(content: &str) -> ProgressNotes {
    let last_updated = RE_LAST_UPDATED
        .captures(content)
        .map(|caps| caps[1].trim().to_string());

    let current_state = section_body(content, CURRENT_STATE_HEADING, &["\n##"], true)
        .map(|body| truncate_chars(body.trim(), CURRENT_STATE_MAX_CHARS))
        .unwrap_or_default();

    let what_was_done = section_body(content, WHAT_WAS_DONE_HEADING, &["\n##"], true)
        .map(|body| truncate_chars(body.trim(), WHAT_WAS_DONE_MAX_CHARS))
        .unwrap_or_default();

    ProgressNotes {
        last_updated,
        current_state,
        what_was_done,
    }
}

/// Body of the section that starts right after `heading`, up to the earliest
/// terminator. With `until_final_newline`, a trailing newline at the end of
/// the file also terminates the section. An unterminated section is `None`.
fn section_body<'a>(
    content: &'a str,
    heading: &str,
    terminators: &[&str],
    until_final_newline: bool,
) -> Option<&'a str> {
    let start = content.find(heading)? + heading.len();
    let rest = &content[start..];

    let mut end = terminators
        .iter()
        .filter_map(|terminator| rest.find(terminator))
        .min();

    if until_final_newline && rest.ends_with('\n') {
        let final_newline = rest.len() - 1;
        end = Some(end.map_or(final_newline, |found| found.min(final_newline)));
    }

    end.map(|end| &rest[..end])
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
