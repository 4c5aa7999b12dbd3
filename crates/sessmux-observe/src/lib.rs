//! Logging setup for sessmux binaries.
//!
//! ```rust
//! use sessmux_observe::{LogConfig, init_logging};
//!
//! let config = LogConfig::default();
//! init_logging(&config).expect("logger");
//! tracing::info!("logger ready");
//! ```

mod config;
mod error;
mod format;
mod init;
mod level;
mod timer;

pub use config::LogConfig;
pub use error::{LogError, LogResult};
pub use format::LogFormat;
pub use level::LogLevel;
pub use timer::UtcRfc3339;

/// Installs the global tracing subscriber described by `cfg`.
///
/// Fails with [`LogError::AlreadyInitialized`] when called twice.
pub fn init_logging(cfg: &LogConfig) -> LogResult<()> {
    match cfg.format {
        LogFormat::Text => init::text(cfg),
        LogFormat::Json => init::json(cfg),
        LogFormat::Journald => init::journald(cfg),
    }
}
