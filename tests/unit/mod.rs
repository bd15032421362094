// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Unit tests for approver-policy-webhook.
//!
//! These tests run without a Kubernetes cluster and drive the admission
//! handler through its public API.

#[path = "../common/mod.rs"]
mod common;

mod dispatch_tests {
    use std::sync::Arc;

    use approver_policy_webhook::webhooks::{
        AdmissionHandler, AdmissionOutcome, DecoderSlot, JsonDecoder, PluginRegistry,
        ValidationContext, Validator,
    };
    use serde_json::json;

    use crate::common::fixtures::{PolicyBuilder, admission_request, policy_request};

    fn ready_handler(registry: &[&str]) -> AdmissionHandler {
        let decoder = Arc::new(DecoderSlot::with_decoder(Arc::new(JsonDecoder)));
        AdmissionHandler::new(decoder, Validator::new(PluginRegistry::new(registry.iter().copied())))
    }

    #[tokio::test]
    async fn test_missing_request_kind_is_bad_request() {
        let handler = ready_handler(&[]);
        let request = admission_request(None, None);

        let outcome = handler.handle(&ValidationContext::default(), &request).await;
        assert_eq!(
            outcome,
            AdmissionOutcome::Errored {
                code: 400,
                message: "no resource kind sent in request".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unrecognised_kind_is_denied() {
        let handler = ready_handler(&[]);
        let request = admission_request(
            Some(("cert-manager.io", "v1", "Certificate")),
            Some(json!({"apiVersion": "cert-manager.io/v1", "kind": "Certificate", "metadata": {"name": "x"}})),
        );

        let outcome = handler.handle(&ValidationContext::default(), &request).await;
        assert_eq!(
            outcome,
            AdmissionOutcome::Denied(
                "validation request for unrecognised resource type: cert-manager.io/v1 Certificate"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_other_version_is_unrecognised() {
        let handler = ready_handler(&[]);
        let request = admission_request(
            Some(("policy.cert-manager.io", "v1beta1", "CertificateRequestPolicy")),
            None,
        );

        let outcome = handler.handle(&ValidationContext::default(), &request).await;
        assert!(matches!(outcome, AdmissionOutcome::Denied(ref msg) if msg.contains("v1beta1")));
    }

    #[tokio::test]
    async fn test_missing_object_is_bad_request() {
        let handler = ready_handler(&[]);
        let request = admission_request(Some(crate::common::fixtures::policy_kind()), None);

        let outcome = handler.handle(&ValidationContext::default(), &request).await;
        assert_eq!(
            outcome,
            AdmissionOutcome::Errored {
                code: 400,
                message: "there is no content to decode".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_decode_before_injection_is_bad_request() {
        let decoder = Arc::new(DecoderSlot::new());
        let handler = AdmissionHandler::new(decoder.clone(), Validator::default());
        let policy = PolicyBuilder::default().issuer_ref("ca").build();

        assert!(!handler.is_ready());
        let outcome = handler
            .handle(&ValidationContext::default(), &policy_request(&policy))
            .await;
        assert_eq!(
            outcome,
            AdmissionOutcome::bad_request("decoder not injected")
        );

        decoder.inject(Arc::new(JsonDecoder)).unwrap();
        assert!(handler.is_ready());
        let outcome = handler
            .handle(&ValidationContext::default(), &policy_request(&policy))
            .await;
        assert!(outcome.is_allowed());
    }

    #[tokio::test]
    async fn test_valid_policy_allowed() {
        let handler = ready_handler(&["rego"]);
        let policy = PolicyBuilder::default()
            .plugin("rego")
            .namespace_labels(&[("team", "platform")])
            .build();

        let outcome = handler
            .handle(&ValidationContext::default(), &policy_request(&policy))
            .await;
        assert_eq!(
            outcome,
            AdmissionOutcome::Allowed("CertificateRequestPolicy validated".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_plugins_denied_in_sorted_order() {
        let handler = ready_handler(&["rego"]);
        let policy = PolicyBuilder::default()
            .plugin("b")
            .plugin("a")
            .issuer_ref("ca")
            .build();

        let outcome = handler
            .handle(&ValidationContext::default(), &policy_request(&policy))
            .await;
        assert_eq!(
            outcome,
            AdmissionOutcome::Denied(
                r#"[spec.plugins: Unsupported value: "a": supported values: "rego", spec.plugins: Unsupported value: "b": supported values: "rego"]"#
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_missing_selector_denied() {
        let handler = ready_handler(&[]);
        let policy = PolicyBuilder::default().build();

        let outcome = handler
            .handle(&ValidationContext::default(), &policy_request(&policy))
            .await;
        assert_eq!(
            outcome,
            AdmissionOutcome::Denied(
                "spec.selector: Required value: one of issuerRef or namespace must be defined, hint: `{}` on either matches everything"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_invalid_match_labels_denied() {
        let handler = ready_handler(&[]);
        let policy = PolicyBuilder::default()
            .namespace_labels(&[("team", "has spaces")])
            .build();

        let outcome = handler
            .handle(&ValidationContext::default(), &policy_request(&policy))
            .await;
        let AdmissionOutcome::Denied(message) = outcome else {
            panic!("expected denial, got {:?}", outcome);
        };
        assert!(message.starts_with(
            r#"spec.selector.namespace.matchLabels: Invalid value: {"team":"has spaces"}: values[0]: Invalid value: "has spaces""#
        ));
    }
}

mod plugin_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use approver_policy_webhook::crd::CertificateRequestPolicy;
    use approver_policy_webhook::webhooks::{
        AdmissionHandler, AdmissionOutcome, DecoderSlot, FieldError, FieldPath, JsonDecoder,
        PluginRegistry, ValidationContext, Validator, ValidatorPlugin, ValidatorPluginResponse,
    };
    use approver_policy_webhook::PluginError;
    use async_trait::async_trait;

    use crate::common::fixtures::{PolicyBuilder, policy_request};

    /// Plugin that requires a `values.allowed = "true"` entry in its config.
    struct RequireAllowedValue {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ValidatorPlugin for RequireAllowedValue {
        fn name(&self) -> &str {
            "rego"
        }

        async fn validate(
            &self,
            _ctx: &ValidationContext,
            policy: &CertificateRequestPolicy,
        ) -> Result<ValidatorPluginResponse, PluginError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let allowed = policy
                .spec
                .plugins
                .get("rego")
                .and_then(|data| data.values.get("allowed"))
                .is_some_and(|v| v == "true");
            if allowed {
                return Ok(ValidatorPluginResponse::allowed());
            }
            Ok(ValidatorPluginResponse::denied(vec![FieldError::required(
                FieldPath::new("spec")
                    .child("plugins")
                    .key("rego")
                    .child("values")
                    .child("allowed"),
                "must be true",
            )]))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl ValidatorPlugin for Unreachable {
        fn name(&self) -> &str {
            "remote"
        }

        async fn validate(
            &self,
            _ctx: &ValidationContext,
            _policy: &CertificateRequestPolicy,
        ) -> Result<ValidatorPluginResponse, PluginError> {
            Err(PluginError::execution("remote", "connection refused"))
        }
    }

    /// Plugin whose cluster lookup fails.
    struct LookupFails;

    #[async_trait]
    impl ValidatorPlugin for LookupFails {
        fn name(&self) -> &str {
            "lookup"
        }

        async fn validate(
            &self,
            _ctx: &ValidationContext,
            _policy: &CertificateRequestPolicy,
        ) -> Result<ValidatorPluginResponse, PluginError> {
            Err(PluginError::Kube {
                plugin: "lookup".to_string(),
                source: kube::Error::Service(std::io::Error::other("connection refused").into()),
            })
        }
    }

    fn handler(validator: Validator) -> AdmissionHandler {
        AdmissionHandler::new(
            Arc::new(DecoderSlot::with_decoder(Arc::new(JsonDecoder))),
            validator,
        )
    }

    #[tokio::test]
    async fn test_plugin_denial_aggregated_with_base_rules() {
        let plugin = Arc::new(RequireAllowedValue {
            calls: AtomicUsize::new(0),
        });
        let handler = handler(Validator::new(PluginRegistry::new(["rego"])).with_plugin(plugin.clone()));
        let policy = PolicyBuilder::default().plugin("rego").build();

        let outcome = handler
            .handle(&ValidationContext::default(), &policy_request(&policy))
            .await;
        let AdmissionOutcome::Denied(message) = outcome else {
            panic!("expected denial, got {:?}", outcome);
        };
        assert!(message.starts_with("[spec.selector: Required value"));
        assert!(message.ends_with("spec.plugins[rego].values.allowed: Required value: must be true]"));
        assert_eq!(plugin.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execution_error_is_internal_and_stops_chain() {
        let after = Arc::new(RequireAllowedValue {
            calls: AtomicUsize::new(0),
        });
        let validator = Validator::new(PluginRegistry::new(["rego"]))
            .with_plugin(Arc::new(Unreachable))
            .with_plugin(after.clone());
        let handler = handler(validator);

        // Invalid selector too: the execution error still wins.
        let policy = PolicyBuilder::default().build();
        let outcome = handler
            .handle(&ValidationContext::default(), &policy_request(&policy))
            .await;

        assert_eq!(
            outcome,
            AdmissionOutcome::Errored {
                code: 500,
                message: "plugin remote: connection refused".to_string(),
            }
        );
        assert_eq!(after.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_kube_error_is_internal_and_stops_chain() {
        let after = Arc::new(RequireAllowedValue {
            calls: AtomicUsize::new(0),
        });
        let validator = Validator::new(PluginRegistry::new(["rego"]))
            .with_plugin(Arc::new(LookupFails))
            .with_plugin(after.clone());
        let handler = handler(validator);

        let policy = PolicyBuilder::default().plugin("rego").issuer_ref("ca").build();
        let outcome = handler
            .handle(&ValidationContext::default(), &policy_request(&policy))
            .await;

        let AdmissionOutcome::Errored { code, message } = outcome else {
            panic!("expected internal error, got {:?}", outcome);
        };
        assert_eq!(code, 500);
        assert!(message.starts_with("plugin lookup: "), "{message}");
        assert!(message.contains("connection refused"), "{message}");
        assert_eq!(after.calls.load(Ordering::SeqCst), 0);
    }
}

mod readiness_tests {
    use std::sync::Arc;

    use approver_policy_webhook::webhooks::{
        AdmissionHandler, AdmissionOutcome, DecoderSlot, JsonDecoder, ValidationContext, Validator,
    };

    use crate::common::fixtures::{PolicyBuilder, policy_request};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readiness_consistent_under_concurrent_requests() {
        let decoder = Arc::new(DecoderSlot::new());
        let handler = AdmissionHandler::new(decoder.clone(), Validator::default());
        let request = Arc::new(policy_request(&PolicyBuilder::default().issuer_ref("ca").build()));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let handler = handler.clone();
            let request = request.clone();
            tasks.push(tokio::spawn(async move {
                let ready_before = handler.is_ready();
                let outcome = handler.handle(&ValidationContext::default(), &request).await;
                // Ready before the call means the decode must have succeeded.
                if ready_before {
                    assert!(outcome.is_allowed(), "{:?}", outcome);
                }
                match outcome {
                    AdmissionOutcome::Allowed(_) => {}
                    AdmissionOutcome::Errored { code, ref message } => {
                        assert_eq!(code, 400);
                        assert_eq!(message, "decoder not injected");
                    }
                    other => panic!("unexpected outcome {:?}", other),
                }
            }));
        }

        let injectors: Vec<_> = (0..4)
            .map(|_| {
                let decoder = decoder.clone();
                tokio::spawn(async move { decoder.inject(Arc::new(JsonDecoder)).is_ok() })
            })
            .collect();

        let mut injected = 0;
        for injector in injectors {
            if injector.await.unwrap() {
                injected += 1;
            }
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(injected, 1);
        assert!(handler.is_ready());
    }
}
