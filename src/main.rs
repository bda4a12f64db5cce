//! Main entry point for the gitspoke CLI

use anyhow::Context;
use clap::Parser;
use gitspoke::cli::Cli;
use gitspoke::metrics;
use gitspoke::shutdown::{self, ShutdownCoordinator};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing; `RUST_LOG` overrides `--log-level`, `LOG_FORMAT=json` selects JSON lines
fn init_tracing(level: &str) {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gitspoke={}", level.to_lowercase())));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    // Install global shutdown coordinator and Ctrl+C handler
    let shutdown = ShutdownCoordinator::shared();
    shutdown::set_global_shutdown(shutdown.clone());
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - finishing current item and saving manifest...");
                shutdown.request_shutdown();
            }
        }
    });

    let result: anyhow::Result<()> = async {
        if let Some(addr) = cli.metrics_addr {
            metrics::init_metrics(addr).context("failed to start metrics exporter")?;
        }
        cli.execute(shutdown.clone())
            .await
            .with_context(|| format!("archiving {} failed", cli.url))?;
        Ok(())
    }
    .await;

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
