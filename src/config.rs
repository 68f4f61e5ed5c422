use log::warn;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::GridError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SNAPSHOT_DIR: &str = "snapshots";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

pub const HOST_VAR: &str = "GRID_HOST";
pub const PORT_VAR: &str = "GRID_PORT";
pub const SNAPSHOT_DIR_VAR: &str = "GRID_SNAPSHOT_DIR";
pub const SESSION_TTL_VAR: &str = "GRID_SESSION_TTL_SECS";
pub const MAX_SESSIONS_VAR: &str = "GRID_MAX_SESSIONS";

/// Server settings. Defaults, then environment, then the positional
/// `<port>` argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub snapshot_dir: PathBuf,
    /// Sessions idle for longer than this are dropped.
    pub session_ttl: Duration,
    /// Upper bound on live sessions; the least recently used goes first.
    pub max_sessions: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            session_ttl: DEFAULT_SESSION_TTL,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

fn parse_port(raw: &str, source: &str) -> Option<u16> {
    match raw.trim().parse::<u16>() {
        Ok(port) => Some(port),
        Err(_) => {
            warn!("ignoring invalid port `{}` from {}", raw, source);
            None
        }
    }
}

fn parse_positive(raw: &str, source: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!("ignoring invalid value `{}` from {}", raw, source);
            None
        }
    }
}

impl AppConfig {
    /// `args` excludes the program name.
    pub fn from_sources<F>(lookup: F, args: &[String]) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(host) = lookup(HOST_VAR).filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_VAR).and_then(|p| parse_port(&p, PORT_VAR)) {
            config.port = port;
        }
        if let Some(dir) = lookup(SNAPSHOT_DIR_VAR).filter(|d| !d.trim().is_empty()) {
            config.snapshot_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup(SESSION_TTL_VAR).and_then(|s| parse_positive(&s, SESSION_TTL_VAR)) {
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = lookup(MAX_SESSIONS_VAR).and_then(|m| parse_positive(&m, MAX_SESSIONS_VAR)) {
            config.max_sessions = max as usize;
        }

        if let Some(port) = args.first().and_then(|p| parse_port(p, "arguments")) {
            config.port = port;
        }

        config
    }

    pub fn from_env_and_args() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        AppConfig::from_sources(|key| env::var(key).ok(), &args)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve a client-supplied snapshot name inside the snapshot directory.
    /// Names that could escape it are rejected.
    pub fn snapshot_path(&self, name: &str) -> Result<PathBuf, GridError> {
        let name = name.trim();
        let escapes = name.is_empty()
            || name.contains(['/', '\\'])
            || name == "."
            || name == ".."
            || Path::new(name).is_absolute();
        if escapes {
            return Err(GridError::InvalidSnapshotName(name.to_string()));
        }
        Ok(self.snapshot_dir.join(name))
    }
}
