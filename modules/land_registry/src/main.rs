//! Land Registry API server

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use land_registry::config::LoggingConfig;
use land_registry::{Config, LandRegistryModule};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "land-registry-server", version, about = "Land Registry API server")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "LAND_REGISTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured listen address
    #[arg(long)]
    bind: Option<String>,

    /// Apply database migrations and exit
    #[arg(long)]
    migrate_only: bool,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    init_tracing(&config.logging);

    tracing::info!("Starting Land Registry API server");

    let db = Arc::new(LandRegistryModule::connect(&config).await?);
    let module = LandRegistryModule::default();
    module.migrate(&db).await?;

    if cli.migrate_only {
        tracing::info!("Migrations applied, exiting");
        return Ok(());
    }

    let bind_addr = config.bind_addr.clone();
    module.init(config, db)?;

    let app = module
        .register_rest(Router::new())?
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!(addr = %bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
