use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::{format::LogFormat, level::LogLevel};

/// Logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` expression, e.g. `"info"` or `"sessmux_core=debug,info"`.
    pub level: LogLevel,
    /// Include module targets in text and json output.
    pub with_targets: bool,
    /// Colored text output when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LogConfig {
    /// Color is used only when enabled and stdout is a terminal.
    pub fn ansi(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}
