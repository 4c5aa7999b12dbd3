use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{accumulator::FamilyOrder, rewrite::RewriteMode};

/// Socket of the host-wide exporter.
pub const DEFAULT_SYSTEM_SOCKET: &str = "/run/systemd_exporter.sock";

/// Socket file name inside each session's runtime directory.
pub const DEFAULT_USER_SOCKET: &str = "systemd_exporter.sock";

/// Per-source fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Aggregation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Path of the host-wide exporter socket.
    pub system_socket: PathBuf,
    /// Socket name appended to each session's runtime directory.
    pub user_socket: String,
    /// Upper bound for one source fetch in milliseconds; `0` disables it.
    pub fetch_timeout_ms: u64,
    /// How session lines are attributed.
    pub rewrite: RewriteMode,
    /// Family order of the merged document.
    pub order: FamilyOrder,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            system_socket: PathBuf::from(DEFAULT_SYSTEM_SOCKET),
            user_socket: DEFAULT_USER_SOCKET.to_string(),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            rewrite: RewriteMode::default(),
            order: FamilyOrder::default(),
        }
    }
}

impl AggregatorConfig {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_ms > 0).then(|| Duration::from_millis(self.fetch_timeout_ms))
    }
}
