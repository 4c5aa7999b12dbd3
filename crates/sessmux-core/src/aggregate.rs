use std::{
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::{
    accumulator::{Accumulator, SharedAccumulator, lock},
    config::AggregatorConfig,
    directory::{Session, SessionDirectory},
    error::{DirectoryError, FetchError},
    fetch::fetch,
    parser::SourceParser,
    source::Source,
    status::FailureReport,
};

/// Result of one aggregation cycle.
#[derive(Debug, Clone)]
pub struct Scrape {
    /// Every family merged from all sources plus the failure indicators.
    pub families: Accumulator,
    pub report: FailureReport,
}

impl Scrape {
    /// Renders the merged exposition document.
    pub fn render(&self) -> String {
        self.families.render()
    }
}

/// Fans a scrape out to the host-wide exporter and every session exporter.
pub struct Aggregator<D> {
    directory: Arc<D>,
    config: Arc<AggregatorConfig>,
}

impl<D> Clone for Aggregator<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            config: Arc::clone(&self.config),
        }
    }
}

enum FetchFailure {
    Resolve(DirectoryError),
    Fetch(FetchError),
}

impl<D> Aggregator<D>
where
    D: SessionDirectory,
{
    pub fn new(directory: Arc<D>, config: AggregatorConfig) -> Self {
        Self {
            directory,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Runs one full aggregation cycle.
    ///
    /// Only a failure to enumerate sessions is returned as an error; every
    /// per-source failure is logged and reported through the failure
    /// indicator families instead.
    pub async fn scrape(&self) -> Result<Scrape, DirectoryError> {
        let started = Instant::now();
        let sessions = self.directory.list_sessions().await.inspect_err(|e| {
            error!(error = %e, "cannot enumerate sessions");
        })?;

        let shared: Arc<SharedAccumulator> = Arc::new(Mutex::new(Accumulator::new()));
        // Slot 0 is the host-wide source, slot i + 1 is sessions[i].
        let mut failed = vec![true; sessions.len() + 1];

        let mut tasks = JoinSet::new();
        tasks.spawn(self.clone().run(0, None, Arc::clone(&shared)));
        for (i, session) in sessions.iter().enumerate() {
            tasks.spawn(self.clone().run(i + 1, Some(session.clone()), Arc::clone(&shared)));
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, ok)) => failed[slot] = !ok,
                Err(e) => error!(error = %e, "fetch task aborted"),
            }
        }

        let mut families = match Arc::try_unwrap(shared) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => lock(&shared).clone(),
        };

        let report = FailureReport {
            system_failed: failed[0],
            users: sessions
                .into_iter()
                .zip(failed.iter().skip(1))
                .map(|(session, failed)| (session.identity, *failed))
                .collect(),
        };

        match report.encode() {
            Ok(text) => {
                SourceParser::passthrough().feed_document(&mut families, &text);
            }
            Err(e) => error!(error = %e, "cannot encode failure indicators"),
        }
        families.reorder(self.config.order);

        debug!(
            sources = failed.len(),
            failures = report.failures(),
            families = families.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape finished",
        );
        Ok(Scrape { families, report })
    }

    /// Fetches one source into `shared`; returns its slot and whether it succeeded.
    async fn run(
        self,
        slot: usize,
        session: Option<Session>,
        shared: Arc<SharedAccumulator>,
    ) -> (usize, bool) {
        let source = match &session {
            Some(session) => Source::user(session.identity.clone()),
            None => Source::System,
        };

        let outcome = match self.socket_for(session.as_ref()).await {
            Ok(socket) => {
                let parser = source.parser(self.config.rewrite);
                fetch(
                    &source,
                    &socket,
                    &parser,
                    &shared,
                    self.config.fetch_timeout(),
                )
                .await
                .map_err(FetchFailure::Fetch)
            }
            Err(e) => Err(FetchFailure::Resolve(e)),
        };

        match outcome {
            Ok(stats) => {
                debug!(source = %source, lines = stats.lines, "source fetched");
                (slot, true)
            }
            Err(FetchFailure::Resolve(e)) => {
                warn!(source = %source, error = %e, "cannot locate exporter socket");
                (slot, false)
            }
            Err(FetchFailure::Fetch(e)) => {
                warn!(source = %source, error = %e, "fetch failed");
                (slot, false)
            }
        }
    }

    async fn socket_for(&self, session: Option<&Session>) -> Result<PathBuf, DirectoryError> {
        match session {
            None => Ok(self.config.system_socket.clone()),
            Some(session) => {
                let runtime = self.directory.runtime_path(session).await?;
                Ok(runtime.join(&self.config.user_socket))
            }
        }
    }
}
