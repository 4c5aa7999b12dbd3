use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::DirectoryError;

/// A logged-in session as reported by a [`SessionDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Identity used for attribution, e.g. the user name.
    pub identity: String,
    /// Directory-specific handle passed back to [`SessionDirectory::runtime_path`].
    pub handle: String,
}

impl Session {
    pub fn new(identity: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            handle: handle.into(),
        }
    }
}

/// Enumerates active sessions and locates their runtime directories.
///
/// The exporter socket of a session lives inside the runtime directory
/// returned by [`runtime_path`](Self::runtime_path).
#[async_trait]
pub trait SessionDirectory: Send + Sync + 'static {
    /// Lists the sessions active right now.
    ///
    /// An error here fails the whole scrape.
    async fn list_sessions(&self) -> Result<Vec<Session>, DirectoryError>;

    /// Resolves the runtime directory of one session.
    ///
    /// An error here fails only that session.
    async fn runtime_path(&self, session: &Session) -> Result<PathBuf, DirectoryError>;
}
