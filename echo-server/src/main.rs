use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use data::repositories::json::persistence::{JsonFilePersistence, MemoryPersistence, Persistence};
use data::repositories::json::store::FeedStore;
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::presence::{PresenceRegistry, spawn_sweeper};
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let persistence: Arc<dyn Persistence> = match &settings.data_file {
        Some(path) => {
            info!(path = %path.display(), "using JSON data file");
            Arc::new(JsonFilePersistence::new(path))
        }
        None => {
            warn!("ECHO_DATA_FILE is :memory:, data will not survive a restart");
            Arc::new(MemoryPersistence::new())
        }
    };
    let store = Arc::new(
        FeedStore::open(persistence)
            .await
            .context("failed to open feed store")?,
    );

    let jwt = Arc::new(JwtService::new(
        &settings.jwt_secret,
        settings.jwt_ttl_seconds,
    ));
    let presence = Arc::new(PresenceRegistry::new(Duration::from_secs(
        settings.presence_ttl_secs,
    )));
    let _sweeper = spawn_sweeper(
        presence.clone(),
        Duration::from_secs(settings.presence_sweep_secs),
    );

    let state = AppState::new(store, jwt, presence);

    if state
        .auth_service
        .bootstrap_admin(&settings.admin_username, &settings.admin_password)
        .await
        .context("failed to bootstrap admin account")?
        .is_some()
        && settings.admin_password == "admin"
    {
        warn!("admin account uses the default password, set ADMIN_PASSWORD");
    }

    server::run_http(&settings, state).await
}
