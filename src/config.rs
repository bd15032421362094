//! Runtime configuration from environment variables.
//!
//! | Variable             | Default                         |
//! |----------------------|---------------------------------|
//! | `WEBHOOK_PORT`       | 9443                            |
//! | `HEALTH_PORT`        | 8080                            |
//! | `WEBHOOK_CERT_PATH`  | `/etc/webhook/certs/tls.crt`    |
//! | `WEBHOOK_KEY_PATH`   | `/etc/webhook/certs/tls.key`    |
//! | `REGISTERED_PLUGINS` | empty (comma separated names)   |

use crate::error::ConfigError;
use crate::health::HEALTH_PORT;
use crate::webhooks::{PluginRegistry, WEBHOOK_CERT_PATH, WEBHOOK_KEY_PATH, WEBHOOK_PORT};

/// Webhook process configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub webhook_port: u16,
    pub health_port: u16,
    pub cert_path: String,
    pub key_path: String,
    /// Plugin names policies may configure under `spec.plugins`
    pub registered_plugins: PluginRegistry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_port: WEBHOOK_PORT,
            health_port: HEALTH_PORT,
            cert_path: WEBHOOK_CERT_PATH.to_string(),
            key_path: WEBHOOK_KEY_PATH.to_string(),
            registered_plugins: PluginRegistry::default(),
        }
    }
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            webhook_port: parse_port(&lookup, "WEBHOOK_PORT", defaults.webhook_port)?,
            health_port: parse_port(&lookup, "HEALTH_PORT", defaults.health_port)?,
            cert_path: lookup("WEBHOOK_CERT_PATH").unwrap_or(defaults.cert_path),
            key_path: lookup("WEBHOOK_KEY_PATH").unwrap_or(defaults.key_path),
            registered_plugins: lookup("REGISTERED_PLUGINS")
                .map(|list| PluginRegistry::from_list(&list))
                .unwrap_or(defaults.registered_plugins),
        })
    }
}

fn parse_port<F>(lookup: &F, name: &'static str, default: u16) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidPort {
                name,
                value,
                source,
            }),
    }
}
