use std::fmt;

use crate::{
    parser::SourceParser,
    rewrite::{Attribution, RewriteMode},
};

/// `Host` header value sent to the host-wide exporter.
pub const SYSTEM_IDENTITY: &str = "system";

/// One metrics exporter to scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Host-wide exporter; its lines are never rewritten.
    System,
    /// Exporter of one logged-in user's session.
    User { name: String },
}

impl Source {
    pub fn user(name: impl Into<String>) -> Self {
        Self::User { name: name.into() }
    }

    /// Identity sent as the request's `Host`.
    pub fn host(&self) -> &str {
        match self {
            Source::System => SYSTEM_IDENTITY,
            Source::User { name } => name,
        }
    }

    /// Builds the parser that attributes lines to this source.
    pub fn parser(&self, mode: RewriteMode) -> SourceParser {
        match self {
            Source::System => SourceParser::passthrough(),
            Source::User { name } => SourceParser::attributed(Attribution::new(name, mode)),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::System => f.write_str(SYSTEM_IDENTITY),
            Source::User { name } => write!(f, "user:{name}"),
        }
    }
}
