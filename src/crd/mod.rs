//! Custom Resource Definitions (CRDs) for approver-policy.
//!
//! - `CertificateRequestPolicy`: which CertificateRequests may be approved, and
//!   the plugin configuration used to evaluate them

mod certificate_request_policy;

pub use certificate_request_policy::*;
