use crate::integrations::Integrations;
use crate::model::{DbConnection, ModelManager};
use crate::utils::signal::shutdown_signal;
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod domain;
pub mod error;
pub mod integrations;
pub mod model;
pub mod utils;
pub mod web;

pub static APPLICATION_NAME: &str = "eduportal";

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = config::Config::get_or_init(use_local).await;

    let db = DbConnection::connect(config.app().database_uri())?;
    db.migrate().await?;

    let integrations = Integrations::from_config(config)?;
    build_server_with_services(db, integrations, config)
}

/// Lets callers swap the outbound services, e.g. for fakes in tests.
pub fn build_server_with_services(
    db: DbConnection,
    integrations: Integrations,
    config: &'static Config,
) -> AppResult<(AppState, Router)> {
    let mm = ModelManager::new(db);
    let state = AppState::new(mm, integrations, config);
    let app = web::routes::build_app(state.clone(), config);
    Ok((state, app))
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (state, app) = build_server().await?;
    let config = state.config();
    let listener = TcpListener::bind(config.host().bindto()).await?;

    tracing::info!(
        "{APPLICATION_NAME} is starting at: {}",
        config.host().bindto()
    );
    let axum_handle = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    axum_handle.await?;
    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
