use std::sync::Arc;
use std::time::Duration;

use domain::relay::CampaignRelay;
use domain::store::{CampaignStore, DbStore};
use log::*;
use service::config::Config;
use tokio::net::TcpListener;

mod controller;
mod cookies;
mod error;
mod extractors;
mod params;
pub mod router;

pub use error::{Error, Result};

// Everything a request handler needs. Clone is required for axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub relay: Arc<CampaignRelay>,
    /// Same store the relay records into, used directly by the operator API.
    pub store: Arc<dyn CampaignStore>,
}

impl AppState {
    pub fn new(config: Config, relay: Arc<CampaignRelay>, store: Arc<dyn CampaignStore>) -> Self {
        Self {
            config,
            relay,
            store,
        }
    }

    /// Wires the campaign relay on top of the shared database pool.
    pub fn from_service(state: service::AppState) -> core::result::Result<Self, domain::error::Error> {
        let store: Arc<dyn CampaignStore> =
            Arc::new(DbStore::new(Arc::clone(&state.database_connection)));
        let relay = CampaignRelay::from_config(&state.config, Arc::clone(&store))?;
        Ok(Self::new(state.config, Arc::new(relay), store))
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{interface}:{}", app_state.config.port);
    let grace = Duration::from_secs(app_state.config.output_timeout_secs);
    let dispatcher = Arc::clone(app_state.relay.dispatcher());

    info!("Server starting... listening for connections on http://{server_url}");

    let listener = TcpListener::bind(&server_url).await?;
    axum::serve(listener, router::define_routes(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Draining in-flight campaign tasks");
    dispatcher.shutdown(grace).await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received");
}
