use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};

use sessmux_core::AggregatorConfig;
use sessmux_observe::{LogConfig, LogFormat, LogLevel};

/// Address the merged endpoint listens on.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:9558";

/// Serves the metrics of every logged-in user's exporter as one document.
#[derive(Parser, Debug, Clone)]
#[command(name = "sessmuxd", author, version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, env = "SESSMUX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:9558
    #[arg(long, env = "SESSMUX_LISTEN")]
    pub listen: Option<String>,

    /// Log filter expression, e.g. "info" or "sessmux_core=debug,info"
    #[arg(long, env = "SESSMUX_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log output: text, json or journald
    #[arg(long, env = "SESSMUX_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub listen: String,
    pub logger: LogConfig,
    pub aggregator: AggregatorConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            logger: LogConfig::default(),
            aggregator: AggregatorConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Reads the config file named on the command line, then applies flags.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut cfg = match &cli.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Self::from_json(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            None => Self::default(),
        };
        cfg.apply(cli);
        Ok(cfg)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.listen = listen.clone();
        }
        if let Some(level) = &cli.log_level {
            self.logger.level = level.clone();
        }
        if let Some(format) = cli.log_format {
            self.logger.format = format;
        }
    }
}
