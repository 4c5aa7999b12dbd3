use std::{io, path::PathBuf, time::Duration};

use http::StatusCode;
use thiserror::Error;

/// Failure of a single source fetch.
///
/// Every variant is local to one source: it is logged and turned into a
/// failure indicator, never propagated to the HTTP caller.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connect to {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid request: {0}")]
    Request(#[from] http::Error),

    #[error("http: {0}")]
    Http(#[from] hyper::Error),

    #[error("unexpected response status: {0}")]
    Status(StatusCode),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure reported by a session directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Sessions cannot be enumerated at all.
    #[error("session directory unavailable: {0}")]
    Unavailable(String),

    /// One session's runtime path cannot be determined.
    #[error("cannot resolve runtime path for '{identity}': {reason}")]
    Resolve { identity: String, reason: String },
}

pub type FetchResult<T> = Result<T, FetchError>;
