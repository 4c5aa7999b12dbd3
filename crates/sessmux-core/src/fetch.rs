use std::{path::Path, time::Duration};

use bytes::Bytes;
use http::{Method, Request, header};
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use tokio::{net::UnixStream, task::JoinHandle};
use tracing::trace;

use crate::{
    accumulator::{SharedAccumulator, lock},
    error::{FetchError, FetchResult},
    parser::{LineSplitter, SourceParser},
    source::Source,
};

/// Path requested from every exporter.
pub const METRICS_PATH: &str = "/metrics";

/// Lines applied by one successful fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub lines: usize,
}

/// Aborts the connection driver when dropped.
struct ConnectionGuard(JoinHandle<()>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Scrapes one exporter over its unix socket into `acc`.
///
/// Lines are committed as they arrive: when the stream breaks or the timeout
/// fires, everything applied so far stays in the accumulator.
pub async fn fetch(
    source: &Source,
    socket: &Path,
    parser: &SourceParser,
    acc: &SharedAccumulator,
    timeout: Option<Duration>,
) -> FetchResult<FetchStats> {
    let mut stats = FetchStats::default();
    let scrape = scrape(source, socket, parser, acc, &mut stats);

    match timeout {
        Some(limit) => tokio::time::timeout(limit, scrape)
            .await
            .map_err(|_| FetchError::Timeout(limit))??,
        None => scrape.await?,
    }
    Ok(stats)
}

async fn scrape(
    source: &Source,
    socket: &Path,
    parser: &SourceParser,
    acc: &SharedAccumulator,
    stats: &mut FetchStats,
) -> FetchResult<()> {
    let stream = UnixStream::connect(socket)
        .await
        .map_err(|source| FetchError::Connect {
            path: socket.to_path_buf(),
            source,
        })?;

    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    let _guard = ConnectionGuard(tokio::spawn(async move {
        if let Err(e) = conn.await {
            trace!(error = %e, "exporter connection closed with error");
        }
    }));

    let request = Request::builder()
        .method(Method::GET)
        .uri(METRICS_PATH)
        .header(header::HOST, source.host())
        .header(header::CONNECTION, "close")
        .body(Empty::<Bytes>::new())?;

    let response = sender.send_request(request).await?;
    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    let mut body = response.into_body();
    let mut splitter = LineSplitter::new();
    while let Some(frame) = body.frame().await {
        let Ok(data) = frame?.into_data() else {
            continue;
        };
        let mut guard = lock(acc);
        splitter.push(&data, |line| {
            if parser.feed(&mut guard, line) {
                stats.lines += 1;
            }
        });
    }

    let mut guard = lock(acc);
    splitter.finish(|line| {
        if parser.feed(&mut guard, line) {
            stats.lines += 1;
        }
    });
    Ok(())
}
