use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use petpair_daemon::{
    api, config::AppConfig, pet::PetRules, service::PetService, storage::Storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    info!("Starting PetPair daemon");

    let storage = Storage::connect(&config.storage).await?;
    info!("Storage ready at {}", config.storage.url);

    let rules = PetRules::from_config(&config.rules)?;
    info!(
        species = rules.species_catalog().len(),
        actions = rules.action_catalog().len(),
        enforce_eligibility = rules.enforce_eligibility(),
        "Pet rules loaded"
    );

    let service = PetService::new(storage, rules);
    api::serve(&config.server, service, shutdown_signal()).await?;

    info!("PetPair daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(?err, "Failed to listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
