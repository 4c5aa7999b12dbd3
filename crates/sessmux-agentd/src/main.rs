mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sessmux_api::HttpApi;
use sessmux_core::Aggregator;
use sessmux_login1::Login1Directory;
use sessmux_observe::init_logging;

use crate::config::{AgentConfig, Cli};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AgentConfig::load(&cli)?;

    // 1) logger
    init_logging(&cfg.logger)?;

    // 2) logind, connected on the first scrape
    let directory = Login1Directory::system();

    // 3) aggregator + router
    let aggregator = Aggregator::new(Arc::new(directory), cfg.aggregator.clone());
    let app = HttpApi::new(Arc::new(aggregator)).router();

    // 4) serve until SIGINT/SIGTERM
    let listener = TcpListener::bind(&cfg.listen)
        .await
        .with_context(|| format!("binding {}", cfg.listen))?;
    info!(
        listen = %cfg.listen,
        system_socket = %cfg.aggregator.system_socket.display(),
        user_socket = %cfg.aggregator.user_socket,
        "sessmuxd started",
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("http server")?;

    info!("sessmuxd stopped");
    Ok(())
}

async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => info!("SIGINT received"),
                    _ = term.recv() => info!("SIGTERM received"),
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot watch SIGTERM");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    shutdown.cancel();
}
