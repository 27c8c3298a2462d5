use std::sync::Arc;

use domain::LoginFlow;
use log::*;
use service::config::Config;
use tokio::net::TcpListener;

mod controller;
mod error;
mod extractors;
pub mod router;

pub use error::{Error, Result};

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub login: Arc<LoginFlow>,
}

impl AppState {
    pub fn new(config: Config, login: LoginFlow) -> Self {
        Self {
            config,
            login: Arc::new(login),
        }
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{}:{}", interface, app_state.config.port);
    let listener = TcpListener::bind(&server_url).await?;

    info!(
        "Server starting... listening for connections on http://{} ({})",
        server_url,
        app_state.config.runtime_env()
    );

    axum::serve(listener, router::define_routes(app_state)).await
}
