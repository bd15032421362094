//! Admission webhook server.
//!
//! Serves `POST /validate` for policy.cert-manager.io resources. The API
//! server must be pointed at it by a ValidatingWebhookConfiguration, and the
//! TLS serving certificate is mounted at /etc/webhook/certs/ by default.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use axum_server::tls_rustls::RustlsConfig;
use kube::Client;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::WebhookError;
use crate::health::HealthState;
use crate::webhooks::handler::AdmissionHandler;
use crate::webhooks::plugin::ValidationContext;

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;
/// Path the validating webhook is served on
pub const VALIDATE_PATH: &str = "/validate";

/// Shared state for webhook handlers
pub struct WebhookState {
    pub handler: AdmissionHandler,
    /// Passed through to validator plugins
    pub client: Option<Client>,
    /// Metrics sink, if the health server is running
    pub health_state: Option<Arc<HealthState>>,
}

impl WebhookState {
    pub fn new(
        handler: AdmissionHandler,
        client: Option<Client>,
        health_state: Option<Arc<HealthState>>,
    ) -> Self {
        Self {
            handler,
            client,
            health_state,
        }
    }
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(VALIDATE_PATH, post(validate_policy))
        .with_state(state)
}

/// Validating admission handler for policy.cert-manager.io resources
async fn validate_policy(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to extract admission request");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e))
                        .into_review(),
                ),
            );
        }
    };

    // Plugins stop waiting if the API server hangs up on us.
    let cancellation = CancellationToken::new();
    let _cancel_on_drop = cancellation.clone().drop_guard();
    let ctx = ValidationContext::new(state.client.clone()).with_cancellation(cancellation);

    let start = Instant::now();
    let outcome = state.handler.handle(&ctx, &request).await;
    if let Some(health_state) = &state.health_state {
        health_state
            .metrics
            .record_admission(outcome.label(), start.elapsed().as_secs_f64());
    }

    (
        StatusCode::OK,
        Json(outcome.into_response(&request).into_review()),
    )
}

/// Load the webhook serving certificate and key (PEM format).
///
/// The webhook has no plaintext mode, so a missing or unreadable file is an
/// error rather than a reason to skip serving.
pub async fn load_tls_config(cert_path: &str, key_path: &str) -> Result<RustlsConfig, WebhookError> {
    for path in [cert_path, key_path] {
        if !Path::new(path).exists() {
            return Err(WebhookError::TlsConfig(format!("{path} not found")));
        }
    }

    RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|e| WebhookError::TlsConfig(format!("{cert_path}, {key_path}: {e}")))
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0:`port` and serves the /validate endpoint.
///
/// # Arguments
/// * `state` - Handler, client and metrics shared by requests
/// * `port` - Port to listen on
/// * `tls` - Serving certificate from [`load_tls_config`]
pub async fn run_webhook_server(
    state: Arc<WebhookState>,
    port: u16,
    tls: RustlsConfig,
) -> Result<(), WebhookError> {
    let app = create_webhook_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Webhook server listening with TLS");

    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
