use std::sync::Arc;
use std::time::Duration;

use domain::auth::{MemorySessionStore, MemoryStateCache};
use domain::LoginFlow;
use log::*;
use service::{config::Config, logging::Logger};

/// How often expired anti-forgery states are swept from the cache.
const STATE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
        std::process::exit(1);
    }

    info!("Starting up forge_login...");

    let state_cache = MemoryStateCache::new();
    let sessions = MemorySessionStore::new();

    let login = match LoginFlow::from_config(
        &config,
        Arc::new(state_cache.clone()),
        Arc::new(sessions),
    ) {
        Ok(login) => login,
        Err(e) => {
            error!("Invalid OAuth2 configuration: {e}");
            std::process::exit(1);
        }
    };

    tokio::spawn(sweep_expired_states(state_cache));

    if let Err(e) = web::init_server(web::AppState::new(config, login)).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}

async fn sweep_expired_states(cache: MemoryStateCache) {
    let mut interval = tokio::time::interval(STATE_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let removed = cache.cleanup_expired();
        if removed > 0 {
            debug!("Swept {removed} expired OAuth2 state(s)");
        }
    }
}
