use anyhow::Context;
use clap::Parser;
use trailer_graph::{backend, Cli, HttpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load().context("loading configuration")?;
    info!(
        version = trailer_graph::version(),
        backend = ?config.backend,
        neo4j = ?config.neo4j,
        "starting trailer-graph"
    );

    let graph = backend::connect(&config)
        .await
        .context("connecting to graph store")?;

    let server = HttpServer::new(config, graph.clone());
    let served = server.start(shutdown_signal()).await;

    // Explicit teardown of the shared connection, even if serving failed
    if let Err(e) = graph.close().await {
        error!(error = %e, "failed to close graph backend");
    }
    served.context("HTTP server error")?;

    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
