//! approver-policy-webhook - validating admission webhook for
//! CertificateRequestPolicy resources.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Reads configuration from the environment
//! - Creates the Kubernetes client handed to validator plugins
//! - Starts the health server, loads TLS, injects the decoder, and starts the webhook server
//!
//! Any server exiting is fatal: the process returns an error so the pod restarts.

use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use tokio::signal;
use tracing::info;

use approver_policy_webhook::health::run_health_server;
use approver_policy_webhook::webhooks::{JsonDecoder, WebhookState};
use approver_policy_webhook::{
    AdmissionHandler, Config, DecoderSlot, HealthState, Validator, load_tls_config,
    run_webhook_server,
};

/// Grace period for in-flight admission requests to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("approver_policy_webhook=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    info!("Starting approver-policy-webhook");

    let config = Config::from_env()?;
    info!(
        webhook_port = config.webhook_port,
        health_port = config.health_port,
        plugins = ?config.registered_plugins.names(),
        "Loaded configuration"
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // The decoder is injected after the servers exist; until then readiness
    // reports not ready and requests fail with 400.
    let decoder = Arc::new(DecoderSlot::new());
    let health_state = Arc::new(HealthState::new(decoder.clone()));

    let validator = Validator::new(config.registered_plugins.clone());
    let handler = AdmissionHandler::new(decoder.clone(), validator);

    // Start health server immediately so probes work during startup
    let health_handle = tokio::spawn(run_health_server(
        health_state.clone(),
        config.health_port,
    ));

    // Without a serving certificate nothing can reach the webhook, so fail
    // startup before readiness can turn green.
    let tls = load_tls_config(&config.cert_path, &config.key_path).await?;
    info!(cert_path = %config.cert_path, "Loaded webhook TLS certificate");

    let state = Arc::new(WebhookState::new(
        handler,
        Some(client),
        Some(health_state.clone()),
    ));
    let webhook_handle = tokio::spawn(run_webhook_server(state, config.webhook_port, tls));

    decoder.inject(Arc::new(JsonDecoder))?;
    info!("Decoder injected, webhook ready");

    // Wait for any task to complete (or fail), or shutdown signal
    tokio::select! {
        result = health_handle => {
            result??;
            return Err("health server stopped unexpectedly".into());
        }
        result = webhook_handle => {
            result??;
            return Err("webhook server stopped unexpectedly".into());
        }
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Mark as not ready so the endpoint is removed from the Service
            health_state.begin_shutdown();
            info!("Marked webhook as not ready");

            info!(
                "Waiting {}s for in-flight admission requests to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
        }
    }

    info!("Webhook stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the webhook cannot shut down
/// gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
