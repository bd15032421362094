//! Validating admission webhook for policy.cert-manager.io resources.
//!
//! A CertificateRequestPolicy is checked by the built-in base rules and then
//! by every registered validator plugin, in registration order. Field errors
//! from all checks are combined into one denial; a plugin that fails to run
//! turns the request into an internal error instead.

pub mod base;
pub mod decoder;
pub mod field;
pub mod handler;
pub mod labels;
pub mod outcome;
pub mod plugin;
pub mod registry;
mod server;
pub mod validator;

pub use decoder::{Decoder, DecoderSlot, JsonDecoder};
pub use field::{FieldError, FieldErrorList, FieldErrorType, FieldPath};
pub use handler::AdmissionHandler;
pub use outcome::AdmissionOutcome;
pub use plugin::{ValidationContext, ValidatorPlugin, ValidatorPluginResponse};
pub use registry::PluginRegistry;
pub use server::{
    VALIDATE_PATH, WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT, WebhookState,
    create_webhook_router, load_tls_config, run_webhook_server,
};
pub use validator::Validator;

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
