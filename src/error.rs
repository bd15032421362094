//! Error types for the webhook.
//!
//! Errors are split by how the admission response treats them: decode errors
//! are the client's fault (400), plugin errors mean the validation machinery
//! itself failed (500).

use thiserror::Error;

/// Failure turning a raw admission object into a CertificateRequestPolicy.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// No decoder has been injected yet
    #[error("decoder not injected")]
    NotInjected,

    /// A decoder was already injected; the slot is set at most once
    #[error("decoder already injected")]
    AlreadyInjected,

    /// The request carried no object to decode
    #[error("there is no content to decode")]
    MissingObject,

    /// The object is not the expected type
    #[error("unexpected object type {api_version} {kind}")]
    UnexpectedType { api_version: String, kind: String },

    /// The object could not be deserialized
    #[error("failed to decode object: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A validator plugin could not complete its validation.
#[derive(Error, Debug)]
pub enum PluginError {
    /// The plugin failed while evaluating the policy
    #[error("plugin {plugin}: {message}")]
    Execution { plugin: String, message: String },

    /// The plugin failed reading cluster state
    #[error("plugin {plugin}: {source}")]
    Kube {
        plugin: String,
        #[source]
        source: kube::Error,
    },

    /// The caller cancelled the validation while the plugin was running
    #[error("plugin {plugin}: validation cancelled")]
    Cancelled { plugin: String },
}

impl PluginError {
    /// Create an execution error for the named plugin
    pub fn execution(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        PluginError::Execution {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Name of the plugin that failed
    pub fn plugin(&self) -> &str {
        match self {
            PluginError::Execution { plugin, .. }
            | PluginError::Kube { plugin, .. }
            | PluginError::Cancelled { plugin } => plugin,
        }
    }
}

/// Errors that can occur when running the webhook or health servers
#[derive(Error, Debug)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    /// Server error
    #[error("Webhook server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Invalid environment configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A port variable did not parse as a u16
    #[error("invalid value {value:?} for {name}: {source}")]
    InvalidPort {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}
