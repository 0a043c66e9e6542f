use crate::{
    backend::BookingBackend, configuration::Configuration,
    configuration_handler::ConfigurationHandler, database_interface::DatabaseInterface,
    http::start_server, local_store::LocalStore, token::TokenService,
};
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod backend;
mod configuration;
mod configuration_handler;
mod database_interface;
mod error;
mod http;
mod local_store;
#[cfg(test)]
mod testutils;
mod token;
mod types;

#[derive(Clone)]
pub struct AppState<T: BookingBackend> {
    pub backend: T,
    pub tokens: TokenService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("##############");
    println!("# Car Doctor #");
    println!("##############");

    let configuration = ConfigurationHandler::parse_arguments();
    let tokens = TokenService::new(configuration.access_token_secret());
    if configuration.access_token_secret().is_none() {
        warn!("ACCESS_TOKEN_SECRET is not set, issuing and verifying tokens will fail");
    }

    let address = format!("0.0.0.0:{}", configuration.port());

    if let Some(database_url) = configuration.database_url() {
        let backend = DatabaseInterface::new(&database_url, &configuration.database_name())
            .await
            .context("Failed to establish database connection")?;
        info!("Successfully connected to database");

        let listener = TcpListener::bind(&address).await?;
        info!(%address, "Car doctor server is running");
        start_server(listener, AppState { backend, tokens }).await?;
    } else {
        warn!("No database configured, bookings are kept in memory and lost on restart");
        let backend = match configuration.services_seed() {
            Some(path) => LocalStore::load_services(&path)
                .await
                .with_context(|| format!("Failed to load services from {}", path.display()))?,
            None => LocalStore::default(),
        };

        let listener = TcpListener::bind(&address).await?;
        info!(%address, "Car doctor server is running");
        start_server(listener, AppState { backend, tokens }).await?;
    }

    Ok(())
}
