//! Admission request dispatch.
//!
//! Routes CertificateRequestPolicy requests through decoding and validation.
//! Requests for any other kind are denied, not errored: receiving them is a
//! configuration mistake in the webhook registration, not a server failure.

use std::sync::Arc;

use kube::core::DynamicObject;
use kube::core::GroupVersionKind;
use kube::core::admission::AdmissionRequest;
use tracing::{debug, error, info, warn};

use super::decoder::DecoderSlot;
use super::outcome::AdmissionOutcome;
use super::plugin::ValidationContext;
use super::validator::Validator;
use crate::crd::{CertificateRequestPolicy, POLICY_GROUP, POLICY_KIND, POLICY_VERSION};
use crate::error::DecodeError;

/// Handles validation requests for policy.cert-manager.io resources.
#[derive(Clone)]
pub struct AdmissionHandler {
    decoder: Arc<DecoderSlot>,
    validator: Arc<Validator>,
}

impl AdmissionHandler {
    pub fn new(decoder: Arc<DecoderSlot>, validator: Validator) -> Self {
        Self {
            decoder,
            validator: Arc::new(validator),
        }
    }

    /// Whether the handler can decode requests yet
    pub fn is_ready(&self) -> bool {
        self.decoder.is_ready()
    }

    /// Decide whether the object in `request` may be admitted.
    pub async fn handle(
        &self,
        ctx: &ValidationContext,
        request: &AdmissionRequest<DynamicObject>,
    ) -> AdmissionOutcome {
        let uid = &request.uid;
        debug!(uid = %uid, name = %request.name, "received validation request");

        let Some(kind) = &request.request_kind else {
            return AdmissionOutcome::bad_request("no resource kind sent in request");
        };

        if !is_policy_kind(kind) {
            return AdmissionOutcome::Denied(format!(
                "validation request for unrecognised resource type: {}/{} {}",
                kind.group, kind.version, kind.kind
            ));
        }

        let policy = match self.decode(request) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(uid = %uid, kind = POLICY_KIND, error = %e, "failed to decode CertificateRequestPolicy");
                return AdmissionOutcome::bad_request(e.to_string());
            }
        };

        let outcome =
            AdmissionOutcome::from_validation(self.validator.validate(ctx, &policy).await);
        match &outcome {
            AdmissionOutcome::Allowed(_) => {
                debug!(uid = %uid, kind = POLICY_KIND, "allowed request");
            }
            AdmissionOutcome::Denied(message) => {
                info!(uid = %uid, kind = POLICY_KIND, errors = %message, "denied admission");
            }
            AdmissionOutcome::Errored { message, .. } => {
                error!(uid = %uid, kind = POLICY_KIND, error = %message, "internal error occurred validating request");
            }
        }
        outcome
    }

    fn decode(
        &self,
        request: &AdmissionRequest<DynamicObject>,
    ) -> Result<CertificateRequestPolicy, DecodeError> {
        let object = request.object.as_ref().ok_or(DecodeError::MissingObject)?;
        let raw = serde_json::to_value(object)?;
        self.decoder.decode(&raw)
    }
}

fn is_policy_kind(kind: &GroupVersionKind) -> bool {
    kind.group == POLICY_GROUP && kind.version == POLICY_VERSION && kind.kind == POLICY_KIND
}
