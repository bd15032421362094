// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Property-based tests for approver-policy-webhook.
//!
//! Uses proptest to generate random policies and verify the base rules are
//! deterministic and complete.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use serde_json::Value;

use approver_policy_webhook::crd::{
    CertificateRequestPolicy, CertificateRequestPolicyPluginData,
    CertificateRequestPolicySelector, CertificateRequestPolicySelectorIssuerRef,
    CertificateRequestPolicySelectorNamespace, CertificateRequestPolicySpec,
};
use approver_policy_webhook::webhooks::base::check;
use approver_policy_webhook::webhooks::labels::LabelSelector;
use approver_policy_webhook::webhooks::{FieldErrorType, PluginRegistry};

const REGISTERED: [&str; 3] = ["approver", "rego", "webhook"];

/// Strategy for plugin names, registered or not.
fn plugin_name() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(REGISTERED.to_vec()).prop_map(str::to_string),
        "[a-z]{1,8}",
    ]
}

/// Strategy for valid label keys and values.
fn valid_label() -> impl Strategy<Value = (String, String)> {
    ("[a-z][a-z0-9]{0,10}", "([a-z0-9]([a-z0-9-]{0,8}[a-z0-9])?)?")
}

fn selector(has_issuer: bool, labels: Option<BTreeMap<String, String>>) -> CertificateRequestPolicySelector {
    CertificateRequestPolicySelector {
        issuer_ref: has_issuer.then(CertificateRequestPolicySelectorIssuerRef::default),
        namespace: labels.map(|match_labels| CertificateRequestPolicySelectorNamespace {
            match_names: Vec::new(),
            match_labels,
        }),
    }
}

fn policy(plugins: &[String], selector: CertificateRequestPolicySelector) -> CertificateRequestPolicy {
    CertificateRequestPolicy::new(
        "prop",
        CertificateRequestPolicySpec {
            plugins: plugins
                .iter()
                .map(|name| (name.clone(), CertificateRequestPolicyPluginData::default()))
                .collect(),
            selector,
        },
    )
}

proptest! {
    /// Property: one NotSupported error per unknown name, sorted, regardless
    /// of the order names were inserted in.
    #[test]
    fn test_unknown_plugins_sorted(mut names in prop::collection::vec(plugin_name(), 0..8)) {
        let registry = PluginRegistry::new(REGISTERED);

        let forward = check(&policy(&names, selector(true, None)), &registry);
        names.reverse();
        let reversed = check(&policy(&names, selector(true, None)), &registry);
        prop_assert_eq!(&forward, &reversed);

        let expected: Vec<Value> = names
            .iter()
            .filter(|n| !REGISTERED.contains(&n.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(Value::from)
            .collect();
        let actual: Vec<Value> = forward.iter().map(|e| e.value.clone()).collect();
        prop_assert_eq!(actual, expected);
        prop_assert!(forward.iter().all(|e| e.kind == FieldErrorType::NotSupported));
    }

    /// Property: registered plugins with a valid selector never produce errors.
    #[test]
    fn test_registered_plugins_allowed(
        names in prop::collection::vec(prop::sample::select(REGISTERED.to_vec()), 0..3),
        labels in prop::collection::btree_map("[a-z]{1,6}", "[a-z]{0,6}", 0..4),
        has_issuer in any::<bool>(),
    ) {
        let names: Vec<String> = names.into_iter().map(str::to_string).collect();
        let labels = (!has_issuer).then_some(labels);
        let el = check(&policy(&names, selector(has_issuer, labels)), &PluginRegistry::new(REGISTERED));
        prop_assert!(el.is_empty(), "unexpected errors: {:?}", el.aggregate_message());
    }

    /// Property: the selector-required error appears exactly when both
    /// sub-selectors are absent.
    #[test]
    fn test_selector_required_iff_empty(has_issuer in any::<bool>(), has_namespace in any::<bool>()) {
        let labels = has_namespace.then(BTreeMap::new);
        let el = check(&policy(&[], selector(has_issuer, labels)), &PluginRegistry::default());
        let required = el.iter().filter(|e| e.kind == FieldErrorType::Required).count();
        prop_assert_eq!(required, usize::from(!has_issuer && !has_namespace));
    }

    /// Property: valid labels compile and the selector matches the same map.
    #[test]
    fn test_valid_labels_match_themselves(labels in prop::collection::btree_map(
        valid_label().prop_map(|(k, _)| k),
        valid_label().prop_map(|(_, v)| v),
        0..6,
    )) {
        let selector = LabelSelector::from_match_labels(&labels).unwrap();
        prop_assert!(selector.matches(&labels));
    }

    /// Property: a key containing a space never compiles.
    #[test]
    fn test_keys_with_spaces_rejected(prefix in "[a-z]{1,5}", suffix in "[a-z]{1,5}") {
        let mut labels = BTreeMap::new();
        labels.insert(format!("{} {}", prefix, suffix), "v".to_string());
        prop_assert!(LabelSelector::from_match_labels(&labels).is_err());
    }
}
