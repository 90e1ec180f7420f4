//! tauOS OTA server binary.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ota_core::{ArtifactStore, UpdateCatalog};
use ota_server::auth::{CredentialVerifier, StaticTokenVerifier};
use ota_server::config::ServerConfig;
use ota_server::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "ota_server=debug,ota_core=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let catalog = Arc::new(UpdateCatalog::new());
    let store = ArtifactStore::open(&config.builds_dir).await?;
    let verifier: Arc<dyn CredentialVerifier> =
        Arc::new(StaticTokenVerifier::new(config.admin_token.clone()));
    let state = AppState::new(catalog, store, verifier);

    let app = create_router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!(
        listen = %config.listen,
        builds_dir = %config.builds_dir.display(),
        "OTA server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("OTA server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("shutdown signal received");
}
