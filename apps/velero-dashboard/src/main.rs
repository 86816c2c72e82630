use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use velero_dashboard::{auth, cli, config, openapi, routes, state, sweeper, velero};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::AddrInUse {
            anyhow::anyhow!(
                "dashboard address {addr} is taken by another process; pass --host/--port to serve elsewhere"
            )
        } else {
            anyhow::Error::new(err).context(format!("cannot listen on {addr}"))
        }
    })
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {err:#}");
    }
    tracing::info!("shutting down");
    cancel.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    if args.print_openapi {
        println!(
            "{}",
            serde_json::to_string_pretty(&openapi::openapi_json())?
        );
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::DashboardConfig::from_env(args.static_root)?;
    tracing::info!(
        velero_bin = %config.velero_bin.display(),
        kubeconfig = %config.kubeconfig.display(),
        "using velero"
    );

    let velero = Arc::new(velero::VeleroCli::new(
        config.velero_bin.clone(),
        config.kubeconfig.clone(),
    ));
    let gate = auth::build_gate(&config).context("failed to set up authentication")?;
    let state = state::AppState::new(config, velero, gate.clone());

    let cancel = CancellationToken::new();
    sweeper::SessionSweeper::new(gate, SESSION_SWEEP_INTERVAL).start(cancel.clone());

    let app = routes::router(state)?;
    let addr = format!("{}:{}", args.host, args.port);
    let listener = bind_listener(&addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;
    cancel.cancel();
    Ok(())
}
