//! Command-line configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use claude_dashboard_protocol::{
    DEFAULT_HTTP_PORT, DEFAULT_SIDECAR_URL, DEFAULT_WS_PORT, SIDECAR_TIMEOUT_SECS,
};
use dashboard_core::{Result, StorageConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "claude-dashboard")]
#[command(about = "Local dashboard server for Claude projects")]
#[command(version)]
pub struct Cli {
    /// Address the HTTP and WebSocket listeners bind to
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// HTTP port (static UI and JSON API)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT)]
    pub port: u16,

    /// WebSocket port for live updates
    #[arg(long, default_value_t = DEFAULT_WS_PORT)]
    pub ws_port: u16,

    /// Base URL of the claude-mem sidecar
    #[arg(long, default_value = DEFAULT_SIDECAR_URL)]
    pub sidecar_url: String,

    /// Home directory holding `.claude/` (overrides DASHBOARD_HOME)
    #[arg(long, value_name = "DIR")]
    pub home: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub ws_addr: SocketAddr,
    pub sidecar_url: String,
    pub sidecar_timeout: Duration,
    pub storage: StorageConfig,
}

impl ServerConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let storage = match cli.home {
            Some(home) => StorageConfig::with_home(home),
            None => StorageConfig::from_env()?,
        };

        Ok(Self {
            http_addr: SocketAddr::new(cli.host, cli.port),
            ws_addr: SocketAddr::new(cli.host, cli.ws_port),
            sidecar_url: cli.sidecar_url.trim_end_matches('/').to_string(),
            sidecar_timeout: Duration::from_secs(SIDECAR_TIMEOUT_SECS),
            storage,
        })
    }
}
