//! Mapping validation results to admission responses.

use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};

use super::field::FieldErrorList;
use crate::error::PluginError;

/// Message returned with an allowed policy.
pub const ALLOWED_MESSAGE: &str = "CertificateRequestPolicy validated";

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_FORBIDDEN: u16 = 403;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

/// Final decision for an admission request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// The resource is accepted
    Allowed(String),
    /// The resource is rejected; a policy decision, not a failure
    Denied(String),
    /// The request could not be evaluated
    Errored { code: u16, message: String },
}

impl AdmissionOutcome {
    /// Map the coordinator result: execution error, denial, or allow.
    pub fn from_validation(result: Result<FieldErrorList, PluginError>) -> Self {
        match result {
            Err(e) => AdmissionOutcome::Errored {
                code: STATUS_INTERNAL_SERVER_ERROR,
                message: e.to_string(),
            },
            Ok(el) => match el.aggregate_message() {
                Some(message) => AdmissionOutcome::Denied(message),
                None => AdmissionOutcome::Allowed(ALLOWED_MESSAGE.to_string()),
            },
        }
    }

    /// The request itself is malformed
    pub fn bad_request(message: impl Into<String>) -> Self {
        AdmissionOutcome::Errored {
            code: STATUS_BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionOutcome::Allowed(_))
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            AdmissionOutcome::Allowed(_) => "allowed",
            AdmissionOutcome::Denied(_) => "denied",
            AdmissionOutcome::Errored { .. } => "errored",
        }
    }

    /// Build the response for `request`
    pub fn into_response(self, request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
        let base = AdmissionResponse::from(request);
        match self {
            AdmissionOutcome::Allowed(message) => {
                let mut response = base;
                response.result.code = STATUS_OK;
                response.result.message = message;
                response
            }
            AdmissionOutcome::Denied(message) => {
                let mut response = base.deny(message);
                response.result.code = STATUS_FORBIDDEN;
                response
            }
            AdmissionOutcome::Errored { code, message } => {
                let mut response = base.deny(message);
                response.result.code = code;
                response
            }
        }
    }
}
