use std::sync::Arc;

use restling::config::Config;
use restling::datastore::MemoryDatastore;
use restling::rest::router::Router;
use restling::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let store = Arc::new(MemoryDatastore::seeded(&cfg.datastore.seed));
    let router = Arc::new(Router::new(&cfg, store));
    if router.registry().is_empty() {
        tracing::warn!("No resources configured; only the home endpoint is served");
    }

    tokio::select! {
        res = server::listener::run(&cfg.server.listen_addr, router) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
