//! approver-policy-webhook library crate
//!
//! Validating admission webhook for cert-manager's CertificateRequestPolicy
//! resources: CRD types, the validation coordinator, the plugin contract, and
//! the webhook and health servers.

pub mod config;
pub mod crd;
pub mod error;
pub mod health;
pub mod webhooks;

pub use config::Config;
pub use error::{ConfigError, DecodeError, PluginError, WebhookError};
pub use health::HealthState;
pub use webhooks::{
    AdmissionHandler, DecoderSlot, PluginRegistry, Validator, ValidatorPlugin, WEBHOOK_CERT_PATH,
    WEBHOOK_KEY_PATH, WEBHOOK_PORT, load_tls_config, run_webhook_server,
};
