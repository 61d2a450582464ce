//! # Vigil Main Entry Point
//!
//! Process bootstrap: configuration, telemetry, secrets, model warmup, serve.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use url::Url;
use vigil::{
    alerts::Alerter,
    config::{AppConfig, ConfigLoader, DetectionConfig, DetectionConfigHandle},
    ensemble::EnsembleEngine,
    secrets::{ALERT_WEBHOOK_URL, SecretStore},
    server::{self, AppState},
    telemetry,
};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Stateless crisis-detection service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration and secrets, then exit
    CheckConfig,
    /// Load the models, run one warmup inference each, report latencies
    Warmup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load()?;
    telemetry::init_tracing(&config)?;

    let detection = DetectionConfig::default();
    detection.validate()?;

    if let Some(Commands::CheckConfig) = cli.command {
        resolve_webhook(&config)?;
        println!("configuration ok (profile: {})", config.profile);
        if let Ok(redacted) = config.redacted_json() {
            println!("{redacted}");
        }
        return Ok(());
    }

    let engine = Arc::new(EnsembleEngine::new());
    let warmup = server::warm_up(&engine, &detection).await;

    if let Some(Commands::Warmup) = cli.command {
        for model in &warmup.models {
            println!(
                "{:<12} {:<6} {}ms",
                model.model_id, model.status, model.warmup_latency_ms
            );
        }
        return Ok(());
    }

    let webhook_url = resolve_webhook(&config)?;
    let alerter = Arc::new(Alerter::new(webhook_url, config.testing_mode));

    let state = AppState {
        config: Arc::new(config),
        engine,
        detection: DetectionConfigHandle::new(detection),
        alerter,
        warmup: Arc::new(warmup),
    };

    server::run_server(state).await
}

/// Resolve the operator webhook. Required unless alerting is disabled or the
/// testing flag suppresses sends; missing when required refuses startup.
fn resolve_webhook(config: &AppConfig) -> anyhow::Result<Option<Url>> {
    if !config.alerts_enabled || config.testing_mode {
        return Ok(None);
    }
    let store = SecretStore::new(&config.secrets_dir);
    let raw = store.require(ALERT_WEBHOOK_URL)?;
    let url = Url::parse(&raw).with_context(|| format!("invalid {ALERT_WEBHOOK_URL}"))?;
    Ok(Some(url))
}
