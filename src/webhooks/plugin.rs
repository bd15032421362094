//! Contract for pluggable policy validators.
//!
//! Approver plugins register a [`ValidatorPlugin`] to check the part of a
//! CertificateRequestPolicy they own, usually their entry under
//! `spec.plugins`. Plugins run after the base rules, one at a time, in
//! registration order.

use async_trait::async_trait;
use kube::Client;
use tokio_util::sync::CancellationToken;

use super::field::FieldErrorList;
use crate::crd::CertificateRequestPolicy;
use crate::error::PluginError;

/// Verdict of a single plugin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidatorPluginResponse {
    /// Whether the plugin accepts the policy
    pub allowed: bool,
    /// Reasons for denial; ignored when allowed
    pub errors: FieldErrorList,
}

impl ValidatorPluginResponse {
    /// The plugin accepts the policy
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            errors: FieldErrorList::new(),
        }
    }

    /// The plugin rejects the policy for `errors`
    pub fn denied(errors: impl Into<FieldErrorList>) -> Self {
        Self {
            allowed: false,
            errors: errors.into(),
        }
    }
}

/// Per-request context handed to every plugin.
#[derive(Clone, Default)]
pub struct ValidationContext {
    /// Read-only access to cluster state for plugins that need it
    pub client: Option<Client>,
    /// Cancelled when the caller gives up on the request
    pub cancellation: CancellationToken,
}

impl ValidationContext {
    pub fn new(client: Option<Client>) -> Self {
        Self {
            client,
            cancellation: CancellationToken::new(),
        }
    }

    /// Same client, cancelled together with `token`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

/// A pluggable validator for CertificateRequestPolicy resources.
///
/// Return `Err` only when the plugin could not do its job (a dependency is
/// unreachable, its own configuration is broken). A policy the plugin does
/// not accept is `Ok` with `allowed == false`.
#[async_trait]
pub trait ValidatorPlugin: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Validate `policy`
    async fn validate(
        &self,
        ctx: &ValidationContext,
        policy: &CertificateRequestPolicy,
    ) -> Result<ValidatorPluginResponse, PluginError>;
}
