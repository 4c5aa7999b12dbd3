//! Concurrent fetch-and-merge engine of sessmux.
//!
//! One scrape enumerates the active sessions through a [`SessionDirectory`],
//! fetches the host-wide exporter and every session exporter concurrently over
//! their unix sockets, and merges the exposition text into one [`Accumulator`]:
//! families keep the order they were first seen in, documentation lines are
//! deduplicated, and session samples carry a `user` label.
//!
//! Failed sources never fail the scrape. They are reported through two
//! synthesized families, `systemd_system_failed` and
//! `systemd_user_failed{user}`.

pub mod accumulator;
pub mod aggregate;
pub mod config;
pub mod directory;
pub mod error;
pub mod fetch;
pub mod line;
pub mod parser;
pub mod rewrite;
pub mod source;
pub mod status;

pub use accumulator::{Accumulator, Family, FamilyOrder};
pub use aggregate::{Aggregator, Scrape};
pub use config::AggregatorConfig;
pub use directory::{Session, SessionDirectory};
pub use error::{DirectoryError, FetchError};
pub use parser::SourceParser;
pub use rewrite::RewriteMode;
pub use source::Source;
pub use status::FailureReport;
