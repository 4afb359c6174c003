//! Fire-and-forget process launching.
//!
//! Launches never report back to the HTTP caller: the response goes out
//! immediately and spawn failures, non-zero exits and timeouts only reach
//! the log.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use claude_dashboard_protocol::{GuardianAction, ACTION_TIMEOUT_SECS};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Short name used in log lines
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    /// Kill the process if it runs longer than this
    pub timeout: Option<Duration>,
}

impl LaunchCommand {
    pub fn new(label: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

pub trait Launcher: Send + Sync {
    fn spawn(&self, command: LaunchCommand);
}

/// Spawns real OS processes on the tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn spawn(&self, command: LaunchCommand) {
        tokio::spawn(run_command(command));
    }
}

async fn run_command(command: LaunchCommand) {
    let mut child = match tokio::process::Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(command.timeout.is_some())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            error!(label = %command.label, program = %command.program, error = %err, "Launch error");
            return;
        }
    };
    debug!(label = %command.label, pid = ?child.id(), "Process launched");

    let status = match command.timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                warn!(label = %command.label, timeout_secs = limit.as_secs(), "Process timed out, killing");
                if let Err(err) = child.kill().await {
                    warn!(label = %command.label, error = %err, "Failed to kill timed out process");
                }
                return;
            }
        },
        None => child.wait().await,
    };

    match status {
        Ok(status) if status.success() => debug!(label = %command.label, "Process exited"),
        Ok(status) => error!(label = %command.label, status = %status, "Process exited with failure"),
        Err(err) => error!(label = %command.label, error = %err, "Failed to wait for process"),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Command templates
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }

    fn powershell(&self) -> &'static str {
        match self {
            Platform::Windows => "powershell",
            _ => "pwsh",
        }
    }

    fn file_manager(&self) -> &'static str {
        match self {
            Platform::Windows => "explorer.exe",
            Platform::MacOs => "open",
            Platform::Other => "xdg-open",
        }
    }
}

/// Runs `cmd` in a new terminal window.
pub fn terminal_command(platform: Platform, cmd: &str) -> LaunchCommand {
    match platform {
        Platform::Windows => LaunchCommand::new("launch", "mintty").args(["-e", "/bin/bash", "-c", cmd]),
        Platform::MacOs => {
            let escaped = cmd.replace('\\', "\\\\").replace('"', "\\\"");
            LaunchCommand::new("launch", "osascript").args([
                "-e".to_string(),
                format!("tell application \"Terminal\" to do script \"{escaped}\""),
            ])
        }
        Platform::Other => {
            LaunchCommand::new("launch", "x-terminal-emulator").args(["-e", "bash", "-c", cmd])
        }
    }
}

/// Paths the guardian actions resolve against.
#[derive(Debug, Clone)]
pub struct GuardianPaths {
    pub scripts_dir: PathBuf,
    pub home: PathBuf,
    pub default_projects_dir: PathBuf,
}

/// Builds the process for a guardian action. Every action gets the guardian
/// execution timeout.
pub fn guardian_command(
    platform: Platform,
    action: GuardianAction,
    folder: Option<&str>,
    paths: &GuardianPaths,
) -> LaunchCommand {
    let script = |name: &str| path_arg(&paths.scripts_dir.join(name));
    let powershell = |name: &str| {
        LaunchCommand::new(action.as_str(), platform.powershell()).args([
            "-ExecutionPolicy".to_string(),
            "Bypass".to_string(),
            "-File".to_string(),
            script(name),
        ])
    };

    let command = match action {
        GuardianAction::Optimize => powershell("optimize-pc.ps1").arg("-aggressive"),
        GuardianAction::KillZombies => powershell("kill-zombies.ps1"),
        GuardianAction::Cleanup => powershell("cleanup-all.ps1"),
        GuardianAction::KillAll => powershell("launch-smart.ps1").arg("--kill"),
        GuardianAction::LaunchDaily => powershell("launch-smart.ps1"),
        GuardianAction::LaunchWeekly => powershell("launch-smart.ps1").arg("--weekly"),
        GuardianAction::RestartGuardian => match platform {
            Platform::Windows => {
                LaunchCommand::new(action.as_str(), "wscript.exe").arg(script("start-guardian.vbs"))
            }
            _ => LaunchCommand::new(action.as_str(), "sh").arg(script("start-guardian.sh")),
        },
        GuardianAction::OpenFolder => {
            let folder = folder
                .filter(|folder| !folder.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| path_arg(&paths.default_projects_dir));
            LaunchCommand::new(action.as_str(), platform.file_manager()).arg(folder)
        }
        GuardianAction::OpenClaude => match platform {
            Platform::Windows => {
                let claude = paths
                    .home
                    .join("AppData")
                    .join("Roaming")
                    .join("npm")
                    .join("claude.cmd");
                LaunchCommand::new(action.as_str(), "wt").args([
                    "new-tab".to_string(),
                    "--title".to_string(),
                    "Claude Code".to_string(),
                    "cmd".to_string(),
                    "/k".to_string(),
                    path_arg(&claude),
                ])
            }
            _ => LaunchCommand {
                label: action.as_str().to_string(),
                ..terminal_command(platform, "claude")
            },
        },
    };

    command.with_timeout(Duration::from_secs(ACTION_TIMEOUT_SECS))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Test double
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    commands: std::sync::Mutex<Vec<LaunchCommand>>,
}

#[cfg(test)]
impl RecordingLauncher {
    pub fn commands(&self) -> Vec<LaunchCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Launcher for RecordingLauncher {
    fn spawn(&self, command: LaunchCommand) {
        self.commands.lock().unwrap().push(command);
    }
}
