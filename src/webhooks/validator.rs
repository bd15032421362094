//! Validation coordinator.
//!
//! Runs the base rules and then every registered plugin, in order, collecting
//! all field errors so the caller sees every defect in one round trip. A
//! plugin execution error aborts the pass: no further plugins run and no
//! partial error list is returned.

use std::sync::Arc;

use tracing::{debug, error};

use super::base;
use super::field::FieldErrorList;
use super::plugin::{ValidationContext, ValidatorPlugin};
use super::registry::PluginRegistry;
use crate::crd::CertificateRequestPolicy;
use crate::error::PluginError;

/// Validates CertificateRequestPolicy resources against the base rules and
/// the registered plugins.
#[derive(Clone, Default)]
pub struct Validator {
    registry: PluginRegistry,
    plugins: Vec<Arc<dyn ValidatorPlugin>>,
}

impl Validator {
    /// Create a validator that accepts the plugin names in `registry`.
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            registry,
            plugins: Vec::new(),
        }
    }

    /// Append `plugin` to the chain; plugins run in the order they are added.
    pub fn with_plugin(mut self, plugin: Arc<dyn ValidatorPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Validate `policy`.
    ///
    /// Returns every field error found, or the first plugin execution error.
    /// Each plugin call is abandoned if `ctx.cancellation` fires.
    pub async fn validate(
        &self,
        ctx: &ValidationContext,
        policy: &CertificateRequestPolicy,
    ) -> Result<FieldErrorList, PluginError> {
        let mut el = base::check(policy, &self.registry);

        for plugin in &self.plugins {
            let name = plugin.name();
            let response = tokio::select! {
                biased;
                _ = ctx.cancellation.cancelled() => Err(PluginError::Cancelled {
                    plugin: name.to_string(),
                }),
                response = plugin.validate(ctx, policy) => response,
            };

            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    error!(plugin = name, error = %e, "plugin failed to validate policy");
                    return Err(e);
                }
            };

            if !response.allowed {
                debug!(
                    plugin = name,
                    errors = response.errors.len(),
                    "plugin denied policy"
                );
                el.extend(response.errors);
            }
        }

        Ok(el)
    }
}
