use anyhow::Result;
use dns_standalone::{Config, DynTxtStore, InMemoryTxtStore, Shared, Solver, StandaloneSolver};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let config: Shared = Arc::new(Config::try_from_env()?);
    tracing::debug!("loaded config for group \"{}\"", config.group_name);

    let txt_store: DynTxtStore = Arc::new(InMemoryTxtStore::default());
    let solver = Arc::new(StandaloneSolver::new(config.clone(), txt_store));

    let (stop_tx, stop_rx) = oneshot::channel();
    solver.initialize(stop_rx).await?;

    tracing::info!("API listening on {}", &config.api_bind_addr);
    let api_server = dns_standalone::api::new(config.clone(), solver.clone())?;
    let api_handle = tokio::spawn(api_server);

    let result = tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
            Ok(())
        },
        Ok(api_res) = api_handle => api_res.map_err(anyhow::Error::from),
        () = solver.serve_finished() => Err(anyhow::anyhow!("DNS listener stopped unexpectedly")),
    };

    // The receiver is gone only if the listener's shutdown task already finished.
    let _ = stop_tx.send(());
    solver.wait_for_shutdown().await;
    tracing::info!("goodbye");
    result
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dns_standalone=info".into()),
        )
        .init();
}
