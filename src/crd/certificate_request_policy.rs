//! CertificateRequestPolicy Custom Resource Definition.
//!
//! A CertificateRequestPolicy selects the CertificateRequests it applies to by
//! issuer reference and/or namespace, and carries opaque configuration for
//! each approver plugin that should evaluate those requests.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of the policy resources.
pub const POLICY_GROUP: &str = "policy.cert-manager.io";
/// Served version of CertificateRequestPolicy.
pub const POLICY_VERSION: &str = "v1alpha1";
/// Kind of the policy resource validated by the webhook.
pub const POLICY_KIND: &str = "CertificateRequestPolicy";

/// CertificateRequestPolicy is a cluster-scoped resource describing which
/// CertificateRequests may be approved.
///
/// Example:
/// ```yaml
/// apiVersion: policy.cert-manager.io/v1alpha1
/// kind: CertificateRequestPolicy
/// metadata:
///   name: internal-ca
/// spec:
///   selector:
///     issuerRef:
///       name: internal-ca
///       kind: ClusterIssuer
///       group: cert-manager.io
///     namespace:
///       matchLabels:
///         team: platform
///   plugins:
///     rego:
///       values:
///         policy: allow-all
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "policy.cert-manager.io",
    version = "v1alpha1",
    kind = "CertificateRequestPolicy",
    plural = "certificaterequestpolicies",
    shortname = "crp",
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestPolicySpec {
    /// Configuration for approver plugins, keyed by plugin name.
    /// Every key must name a plugin registered with the approver.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, CertificateRequestPolicyPluginData>,

    /// Which CertificateRequests this policy applies to.
    #[serde(default)]
    pub selector: CertificateRequestPolicySelector,
}

/// Opaque configuration handed to a single plugin.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestPolicyPluginData {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
}

/// Selector matching CertificateRequests. At least one of `issuerRef` or
/// `namespace` must be set; an empty object on either matches everything.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestPolicySelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_ref: Option<CertificateRequestPolicySelectorIssuerRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<CertificateRequestPolicySelectorNamespace>,
}

/// Matches the issuer referenced by a CertificateRequest. Fields accept
/// wildcards; unset fields match any value.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestPolicySelectorIssuerRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Matches the namespace of a CertificateRequest.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestPolicySelectorNamespace {
    /// Namespace names (wildcards accepted).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_names: Vec<String>,

    /// Labels the namespace must carry.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}
