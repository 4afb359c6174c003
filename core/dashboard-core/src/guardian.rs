//! Guardian status for `/api/guardian`.
//!
//! The guardian is an external maintenance process. Its state is assembled
//! from four independent sources; a failing source is logged and the
//! remaining fields keep their seed values.

use fs_err as fs;
use serde_json::{json, Map, Value};
use sysinfo::{Pid, ProcessRefreshKind, System};

use crate::storage::StorageConfig;

pub const RECENT_LOG_LINES: usize = 10;
const BYTES_PER_MB: u64 = 1024 * 1024;

fn seed() -> Map<String, Value> {
    let value = json!({
        "running": false,
        "pid": null,
        "freeRAMMB": 0,
        "totalRAMMB": 0,
        "sessionCount": 0,
        "mcpCount": 0,
        "lastCheck": null,
        "recentLog": [],
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn read_guardian_status(storage: &StorageConfig) -> Value {
    let mut status = seed();

    // State file keys override the seed wholesale.
    if let Some(Value::Object(state)) = read_state_file(storage) {
        status.extend(state);
    }

    if let Some(pid) = read_pid_file(storage) {
        let running = pid.parse::<u32>().is_ok_and(process_alive);
        status.insert("pid".to_string(), Value::String(pid));
        status.insert("running".to_string(), Value::Bool(running));
    }

    if let Some(lines) = read_recent_log(storage) {
        status.insert("recentLog".to_string(), json!(lines));
    }

    let (free_mb, total_mb) = memory_mb();
    status.insert("freeRAMMB".to_string(), json!(free_mb));
    status.insert("totalRAMMB".to_string(), json!(total_mb));

    Value::Object(status)
}

fn read_state_file(storage: &StorageConfig) -> Option<Value> {
    let path = storage.guardian_state_file();
    let content = read_optional(&path)?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, "Malformed guardian state file");
            None
        }
    }
}

fn read_pid_file(storage: &StorageConfig) -> Option<String> {
    read_optional(&storage.guardian_pid_file()).map(|content| content.trim().to_string())
}

fn read_recent_log(storage: &StorageConfig) -> Option<Vec<String>> {
    let content = read_optional(&storage.guardian_log_file())?;
    let lines: Vec<&str> = content.trim().lines().collect();
    let start = lines.len().saturating_sub(RECENT_LOG_LINES);
    Some(lines[start..].iter().map(|line| line.to_string()).collect())
}

fn read_optional(path: &std::path::Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read guardian file");
            None
        }
    }
}

/// Checks if a process with the given PID is currently running.
pub fn process_alive(pid: u32) -> bool {
    let mut sys = System::new();
    let sys_pid = Pid::from(pid as usize);
    sys.refresh_process_specifics(sys_pid, ProcessRefreshKind::new());
    sys.process(sys_pid).is_some()
}

/// Available and total physical memory in MB.
pub fn memory_mb() -> (u64, u64) {
    let mut sys = System::new();
    sys.refresh_memory();
    (
        sys.available_memory() / BYTES_PER_MB,
        sys.total_memory() / BYTES_PER_MB,
    )
}
