//! Compiled regex patterns for scraping report files.
//!
//! These patterns are compiled once on first use. Update them when the
//! mission/daily/progress markdown formats change.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// File Names
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_REPORT_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").unwrap());

// ═══════════════════════════════════════════════════════════════════════════════
// Night Mission Reports
// ═══════════════════════════════════════════════════════════════════════════════

/// `| 1 | project | task | a1b2c3 | status |`
pub static RE_MISSION_TABLE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*\d+\s*\|[^|]+\|[^|]+\|[^|]+\|[^|]+\|").unwrap());
pub static RE_AGENT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9]\d*$").unwrap());
pub static RE_AGENT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^a[0-9a-f]+$").unwrap());
pub static RE_SUCCESS_STATUS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)הושלם|completed|success").unwrap());

pub const MISSION_SUMMARY_HEADING: &str = "## סיכום מנהלים\n";

// ═══════════════════════════════════════════════════════════════════════════════
// Daily Syntheses
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_DAILY_PROJECT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"- .+\*\*.+\*\*.+").unwrap());
pub static RE_BOLD_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
pub static RE_PAREN_STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((.+?)\)").unwrap());

// ═══════════════════════════════════════════════════════════════════════════════
// PROGRESS.md
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_LAST_UPDATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Last Updated:\s*(.+)").unwrap());

pub const CURRENT_STATE_HEADING: &str = "## Current State\n";
pub const WHAT_WAS_DONE_HEADING: &str = "## What Was Done\n";
