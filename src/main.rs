use aigw_extserver::{
    cli::Cli,
    observability::{init_observability, log_config_info},
    storage::{route_store_from_config, ManifestRouteStore},
    xds, Config, Error, Result, APP_NAME, VERSION,
};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    let metrics = init_observability(&config.observability)?;

    info!(app_name = APP_NAME, version = VERSION, "Starting AI Gateway extension server");
    log_config_info(&config);

    // Fail fast on an unreadable manifest; later lookups re-read it.
    if let Some(path) = &config.resolver.manifest_path {
        let routes = ManifestRouteStore::new(path.clone()).load().await.map_err(|e| {
            let message = format!("Invalid route manifest {}", path.display());
            Error::config_with_source(message, Box::new(e))
        })?;
        info!(path = %path.display(), routes = routes.len(), "Loaded route manifest");
    }

    let shutdown = CancellationToken::new();
    let store = route_store_from_config(&config.resolver);
    let hook = xds::hook_service(&config, store, metrics, shutdown.clone());

    let shutdown_signal = async move {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown.cancel();
    };

    xds::start_extension_server(&config.server, hook, shutdown_signal).await
}
