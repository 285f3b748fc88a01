use anyhow::{anyhow, Result};
use ddns::{Config, Shared, Updater, ZoneManager};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4444";
const SHUTDOWN_DRAIN_LIMIT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut args = std::env::args();
    let program_name = args.next().unwrap_or_else(|| "ddns".to_string());
    let (config_file, bind_addr) = (args.next(), args.next());

    let config = config_init(&program_name, config_file)?;
    let bind_addr: SocketAddr = bind_addr
        .as_deref()
        .unwrap_or(DEFAULT_BIND_ADDR)
        .parse()?;

    let zones = Arc::new(ZoneManager::new(Arc::clone(&config)));
    let updater = Arc::new(Updater::new(config, zones));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tracing::info!("API listening on {bind_addr}");
    let server = ddns::api::new(bind_addr, updater, async {
        let _ = shutdown_rx.await;
    });
    let mut server_handle = tokio::spawn(server);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("shutting down");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(SHUTDOWN_DRAIN_LIMIT, &mut server_handle).await {
                Ok(joined) => joined??,
                Err(_) => {
                    tracing::warn!("drain limit reached, aborting in-flight requests");
                    server_handle.abort();
                }
            }
        }
        joined = &mut server_handle => joined??,
    }
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ddns=info".into()),
        )
        .init();
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<Shared> {
    match config_file {
        None => Err(anyhow!(
            "usage: {program_name} /path/to/ddns.yml [bind_addr]"
        )),
        Some(config_file) => {
            let config = Config::try_from_file(&config_file)?;
            tracing::debug!("loaded config from {config_file}");
            Ok(Arc::new(config))
        }
    }
}
