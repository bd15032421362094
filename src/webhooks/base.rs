//! Built-in structural checks every CertificateRequestPolicy must pass.
//!
//! Validates:
//! - Every key under `spec.plugins` names a registered plugin
//! - The selector defines at least one of `issuerRef` or `namespace`
//! - `spec.selector.namespace.matchLabels` compiles into a label selector

use serde_json::Value;

use super::field::{FieldError, FieldErrorList, FieldPath};
use super::labels::LabelSelector;
use super::registry::PluginRegistry;
use crate::crd::CertificateRequestPolicy;

/// Detail attached to a selector with neither sub-selector set.
pub const SELECTOR_REQUIRED_DETAIL: &str =
    "one of issuerRef or namespace must be defined, hint: `{}` on either matches everything";

/// Run the base rules against `policy`.
pub fn check(policy: &CertificateRequestPolicy, registry: &PluginRegistry) -> FieldErrorList {
    let mut el = FieldErrorList::new();
    let fld_path = FieldPath::new("spec");

    // Sorted so the output does not depend on how the plugin map was built.
    let mut unrecognised: Vec<&str> = policy
        .spec
        .plugins
        .keys()
        .map(String::as_str)
        .filter(|name| !registry.contains(name))
        .collect();
    unrecognised.sort_unstable();

    for name in unrecognised {
        el.push(FieldError::not_supported(
            fld_path.child("plugins"),
            name,
            registry.names(),
        ));
    }

    let selector = &policy.spec.selector;
    if selector.issuer_ref.is_none() && selector.namespace.is_none() {
        el.push(FieldError::required(
            fld_path.child("selector"),
            SELECTOR_REQUIRED_DETAIL,
        ));
    }

    if let Some(ns_sel) = &selector.namespace
        && !ns_sel.match_labels.is_empty()
        && let Err(err) = LabelSelector::from_match_labels(&ns_sel.match_labels)
    {
        let value = Value::Object(
            ns_sel
                .match_labels
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect(),
        );
        el.push(FieldError::invalid(
            fld_path.child("selector").child("namespace").child("matchLabels"),
            value,
            err.to_string(),
        ));
    }

    el
}
