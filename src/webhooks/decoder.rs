//! Late-bound object decoder.
//!
//! The decoder is handed to the webhook after the handler is built. Until it
//! arrives every decode fails and the readiness probe reports not ready. The
//! slot is set at most once and never cleared, so reads need no lock.

use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::crd::{CertificateRequestPolicy, POLICY_GROUP, POLICY_KIND, POLICY_VERSION};
use crate::error::DecodeError;

/// Turns a raw admission object into a typed policy.
pub trait Decoder: Send + Sync {
    fn decode(&self, raw: &Value) -> Result<CertificateRequestPolicy, DecodeError>;
}

/// Decodes the JSON object carried in an AdmissionReview.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, raw: &Value) -> Result<CertificateRequestPolicy, DecodeError> {
        let api_version = raw.get("apiVersion").and_then(Value::as_str).unwrap_or_default();
        let kind = raw.get("kind").and_then(Value::as_str).unwrap_or_default();

        if api_version != format!("{POLICY_GROUP}/{POLICY_VERSION}") || kind != POLICY_KIND {
            return Err(DecodeError::UnexpectedType {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
            });
        }

        Ok(serde_json::from_value(raw.clone())?)
    }
}

/// Holds the decoder once it has been injected.
#[derive(Default)]
pub struct DecoderSlot {
    decoder: OnceLock<Arc<dyn Decoder>>,
}

impl DecoderSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot that is ready from the start
    pub fn with_decoder(decoder: Arc<dyn Decoder>) -> Self {
        let slot = Self::new();
        // A fresh slot cannot already be set.
        let _ = slot.decoder.set(decoder);
        slot
    }

    /// Set the decoder. Fails if one was already injected; the first one
    /// stays in place.
    pub fn inject(&self, decoder: Arc<dyn Decoder>) -> Result<(), DecodeError> {
        self.decoder
            .set(decoder)
            .map_err(|_| DecodeError::AlreadyInjected)
    }

    /// Decode `raw` with the injected decoder
    pub fn decode(&self, raw: &Value) -> Result<CertificateRequestPolicy, DecodeError> {
        match self.decoder.get() {
            Some(decoder) => decoder.decode(raw),
            None => Err(DecodeError::NotInjected),
        }
    }

    /// Whether a decoder has been injected
    pub fn is_ready(&self) -> bool {
        self.decoder.get().is_some()
    }
}
