//! Agent session timeline.
//!
//! Combines night mission reports, daily syntheses and per-project
//! PROGRESS.md notes into one date-descending timeline:
//!
//! 1. The newest missions are parsed into `mission` sessions
//! 2. Daily syntheses attach to the mission of the same date, or become
//!    `daily` sessions of their own
//! 3. Recently active, non-terminal registry projects contribute progress notes

use std::path::Path;

use chrono::{Duration, NaiveDate};
use claude_dashboard_protocol::{Project, ProjectRegistry};
use fs_err as fs;

use crate::reports::{
    date_from_file_name, parse_daily_report, parse_mission_report, parse_progress_notes,
    report_files, ReportKind,
};
use crate::storage::StorageConfig;
use crate::types::{
    AgentSession, AgentSessions, DailySession, MissionSession, ProgressUpdate, SessionStats,
};

/// Only the newest reports of each kind are parsed.
pub const MAX_PARSED_REPORTS: usize = 10;
pub const PROGRESS_WINDOW_DAYS: i64 = 7;
pub const PROGRESS_FILE_NAME: &str = "PROGRESS.md";

pub fn aggregate_agent_sessions(
    storage: &StorageConfig,
    registry: &ProjectRegistry,
    today: NaiveDate,
) -> AgentSessions {
    let mut stats = SessionStats::default();

    let mission_dir = ReportKind::Mission.dir(storage);
    let mission_files = report_files(&mission_dir, ReportKind::Mission);
    stats.total_missions = mission_files.len();

    let mut missions: Vec<MissionSession> = Vec::new();
    for file in mission_files.iter().take(MAX_PARSED_REPORTS) {
        let Some(content) = read_report(&mission_dir, file) else {
            continue;
        };
        let parsed = parse_mission_report(&content);
        stats.total_agents += parsed.agents.len();
        stats.total_success += parsed.success_count;

        missions.push(MissionSession {
            date: date_from_file_name(file),
            file: file.clone(),
            agent_count: parsed.agents.len(),
            success_count: parsed.success_count,
            agents: parsed.agents,
            summary: parsed.summary,
            daily_projects: None,
        });
    }

    let daily_dir = ReportKind::Daily.dir(storage);
    let mut dailies: Vec<DailySession> = Vec::new();
    for file in report_files(&daily_dir, ReportKind::Daily)
        .iter()
        .take(MAX_PARSED_REPORTS)
    {
        let Some(content) = read_report(&daily_dir, file) else {
            continue;
        };
        let date = date_from_file_name(file);
        let projects = parse_daily_report(&content);

        match missions.iter_mut().find(|mission| mission.date == date) {
            Some(mission) => mission.daily_projects = Some(projects),
            None => dailies.push(DailySession {
                date,
                file: file.clone(),
                project_count: projects.len(),
                projects,
            }),
        }
    }

    let last_mission = missions.first().cloned().map(AgentSession::Mission);

    let mut sessions: Vec<AgentSession> = missions
        .into_iter()
        .map(AgentSession::Mission)
        .chain(dailies.into_iter().map(AgentSession::Daily))
        .collect();
    sessions.sort_by(|a, b| b.date().cmp(a.date()));

    AgentSessions {
        sessions,
        last_mission,
        stats,
        progress_updates: collect_progress_updates(registry, today),
    }
}

/// Progress notes of projects active within the last week.
pub fn collect_progress_updates(registry: &ProjectRegistry, today: NaiveDate) -> Vec<ProgressUpdate> {
    let cutoff = (today - Duration::days(PROGRESS_WINDOW_DAYS))
        .format("%Y-%m-%d")
        .to_string();

    registry
        .projects
        .iter()
        .filter(|project| is_recently_active(project, &cutoff))
        .filter_map(|project| {
            let folder = project.folder.as_deref()?;
            let path = Path::new(folder).join(PROGRESS_FILE_NAME);
            if !path.exists() {
                return None;
            }
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(error = %err, project = %project.id, "Failed to read progress notes");
                    return None;
                }
            };
            let notes = parse_progress_notes(&content);
            Some(ProgressUpdate {
                project_id: project.id.clone(),
                project_name: project.name.clone(),
                icon: project.icon.clone(),
                last_updated: notes.last_updated.or_else(|| project.last_session.clone()),
                current_state: notes.current_state,
                what_was_done: notes.what_was_done,
            })
        })
        .collect()
}

fn is_recently_active(project: &Project, cutoff: &str) -> bool {
    let recent = project
        .last_session
        .as_deref()
        .is_some_and(|last| last >= cutoff);
    let has_folder = project.folder.as_deref().is_some_and(|f| !f.is_empty());
    recent && has_folder && !project.is_terminal()
}

fn read_report(dir: &Path, file: &str) -> Option<String> {
    match fs::read_to_string(dir.join(file)) {
        Ok(content) => Some(content),
        Err(err) => {
            tracing::warn!(error = %err, file, "Failed to read report");
            None
        }
    }
}
