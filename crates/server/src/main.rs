//! Gatehouse server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use gatehouse_core::config::AppConfig;
use gatehouse_media::{StagingArea, Uploader};
use gatehouse_server::{create_router, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Gatehouse - identity and session service
#[derive(Parser, Debug)]
#[command(name = "gatehoused")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "GATEHOUSE_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Gatehouse v{}", env!("CARGO_PKG_VERSION"));

    // Config file is optional, env vars can provide/override everything
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let has_env_config = std::env::vars()
        .any(|(key, _)| key.starts_with("GATEHOUSE_") && key != "GATEHOUSE_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: gatehoused --config /path/to/config.toml\n  \
             2. Environment variables: GATEHOUSE_SERVER__BIND=0.0.0.0:8080 \
             GATEHOUSE_AUTH__ACCESS_SECRET=... GATEHOUSE_AUTH__REFRESH_SECRET=... gatehoused\n\n\
             See config/server.example.toml for example configuration.\n\
             Set GATEHOUSE_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("GATEHOUSE_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let identities = gatehouse_identity::from_config(&config.identity)
        .await
        .context("failed to initialize identity store")?;
    tracing::info!("Identity store initialized");

    identities
        .health_check()
        .await
        .context("identity store health check failed")?;

    let media = gatehouse_media::from_config(&config.media.backend)
        .await
        .context("failed to initialize media store")?;
    tracing::info!(backend = media.backend_name(), "Media store initialized");

    // Catch misconfiguration before accepting requests
    media
        .health_check()
        .await
        .context("media store health check failed")?;

    let staging = StagingArea::new(&config.media.staging_dir)
        .await
        .context("failed to initialize staging area")?;

    let uploader = Uploader::new(media);
    let state = AppState::new(config.clone(), identities, uploader, staging);

    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
