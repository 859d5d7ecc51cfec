use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

/// Where the demo webhook output posts to, unless `SEED_WEBHOOK_URL` says otherwise.
const DEFAULT_WEBHOOK_URL: &str = "https://httpbin.org/post";

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Seeding database [{}]...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let webhook_url =
        std::env::var("SEED_WEBHOOK_URL").unwrap_or_else(|_| DEFAULT_WEBHOOK_URL.to_string());

    let service_state = service::AppState::new(config, &db);

    match entity_api::seed_database(service_state.db_conn_ref(), &webhook_url).await {
        Ok((list, webhook)) => info!(
            "Try it: {}//{}/t/google/{}?o={}",
            service_state.config.protocol(),
            service_state.config.hostname(),
            list.id,
            webhook.id
        ),
        Err(e) => {
            error!("Failed to seed database: {e:?}");
            std::process::exit(1);
        }
    }
}
