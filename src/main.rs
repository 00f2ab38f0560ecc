#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use std::net::SocketAddr;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::JwtKeys;
use crate::api::router;
use crate::database::Database;
use crate::database::DatabaseConfig;
use crate::metadata::HttpPageClient;
use crate::metadata::MetadataFetcher;
use crate::settings::SettingsStore;
use crate::users::ensure_initial_user;
use crate::utils::env_flag;
use crate::utils::env_var_or_else;

mod alias;
mod api;
mod database;
mod graceful_shutdown;
mod links;
mod metadata;
mod password;
mod root;
mod settings;
#[cfg(test)]
mod tests;
mod users;
mod utils;
mod validation;

const DEFAULT_RUST_LOG: &str = "shortie=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app(DatabaseConfig::DetectConfig).await?;

    let address = setup_address()?;
    tracing::info!("Listening on {}", address);

    let listener = TcpListener::bind(&address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful_shutdown::handler())
    .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Database connection
/// - Initial user setup
/// - Loading the options
/// - HTTP client for the metadata
pub async fn setup_app(database_config: DatabaseConfig) -> Result<Router> {
    let database = Database::from_config(database_config).await?;

    ensure_initial_user(&database).await?;

    let settings = SettingsStore::load(&database).await?;
    let fetcher = setup_metadata_fetcher()?;

    Ok(create_router(database, settings, fetcher))
}

/// Create the router for Shortie
fn create_router(
    database: Database,
    settings: SettingsStore,
    fetcher: MetadataFetcher,
) -> Router {
    let jwt_keys = setup_jwt_keys();

    Router::new()
        .nest("/api", router())
        .fallback(get(root::root))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(database))
        .layer(Extension(settings))
        .layer(Extension(fetcher))
        .layer(Extension(jwt_keys))
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}

fn setup_jwt_keys() -> JwtKeys {
    use crate::password::generate;

    let jwt_secret = env_var_or_else("JWT_SECRET", || {
        let jwt_secret = generate();
        tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
        jwt_secret
    });

    JwtKeys::new(jwt_secret.as_bytes())
}

/// Metadata is fetched unless `FETCH_METADATA` is turned off
fn setup_metadata_fetcher() -> Result<MetadataFetcher> {
    if env_flag("FETCH_METADATA", true) {
        Ok(MetadataFetcher::new(HttpPageClient::new()?))
    } else {
        tracing::info!("`FETCH_METADATA` is off, links will not get metadata");
        Ok(MetadataFetcher::disabled())
    }
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Ok(port) = std::env::var("PORT") {
        // only check non-empty strings
        if !port.is_empty() {
            let port = port.parse::<u16>()?;

            address.set_port(port);
        }
    }

    Ok(address)
}
