#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use clap::Parser;
use server::{
    app,
    config::{CliArgs, ServerConfig},
    service::handler::HashService,
    telemetry::init_telemetry,
};
use tokio::{net::TcpListener, signal};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; flags and the environment still apply.
    let _ = dotenvy::dotenv();
    let config = ServerConfig::try_from(CliArgs::parse())?;

    let providers = init_telemetry()?;

    let listener = TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_addr))?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        local_addr = %listener.local_addr()?,
        workers = config.pool.num_workers,
        digest = %config.digest,
        max_allowed_strings = config.max_allowed_strings,
        "Hash service listening"
    );

    let service = HashService::new(config, providers.metrics.clone());
    let served = app::serve(listener, service, termination()).await;

    // Flush exporters even when serving failed.
    providers.shutdown();

    #[cfg(feature = "tracing")]
    {
        if served.is_ok() {
            tracing::info!("Hash service stopped");
        }
    }
    served
}

/// Resolves on Ctrl+C, or on SIGTERM where the platform has it.
async fn termination() {
    let ctrl_c = async {
        if let Err(_e) = signal::ctrl_c().await {
            #[cfg(feature = "tracing")]
            tracing::warn!("Ctrl+C handler unavailable: {_e}");
            core::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("SIGTERM handler unavailable: {_e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received Ctrl+C");
        },
        () = terminate => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received SIGTERM");
        },
    }
}
