use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info};

use cve_manager::config::{BuildInfo, Command, Config};
use cve_manager::health::HealthServer;
use cve_manager::{logging, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_args();
    let build = BuildInfo::CURRENT;

    if let Some(Command::Version) = &config.command {
        println!("{}", build);
        return Ok(());
    }

    logging::init(&config.log_format, &config.log_level);
    info!(
        version = build.version,
        build_date = build.build_date,
        server_port = config.server_port,
        health_port = config.health_port,
        "cve-manager starting"
    );

    if let Err(e) = config.validate() {
        error!(error = %e, "Configuration validation failed");
        std::process::exit(1);
    }

    let health_server = start_health_server(config.health_port).await;
    let shutdown = shutdown_on_ctrl_c();

    if let Err(e) = web::run(config, health_server, shutdown).await {
        error!(error = %e, "Application error");
        std::process::exit(1);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Spawn the health server and wait until its listener is bound
async fn start_health_server(port: u16) -> HealthServer {
    let health_server = HealthServer::new();
    let server = health_server.clone();
    let (bound_tx, bound_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        if let Err(e) = server.serve(port, bound_tx).await {
            error!(error = %e, "Health check server failed");
        }
    });

    if bound_rx.await.is_ok() {
        info!(port = port, "Health check server started");
    }
    health_server
}

fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = tx.send(true);
        }
    });
    rx
}
