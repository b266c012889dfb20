//! HMAC-SHA256 webhook signatures.
//!
//! The platform signs the raw request body with the shared secret and sends
//! the digest as standard, padded base64 in `X-Shopify-Hmac-Sha256`. The
//! comparison is a full-value match over the encoded string, done in
//! constant time.

use super::WebhookError;
use crate::WebhookSecret;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the base64-encoded HMAC-SHA256 of `body` keyed by `secret`.
///
/// # Errors
///
/// Returns [`WebhookError::InvalidSecret`] if the secret is rejected as an
/// HMAC key. HMAC accepts keys of any length, so this only surfaces a broken
/// crypto backend.
///
/// # Examples
///
/// ```rust
/// use storefront_hooks_core::{webhook::compute_signature, WebhookSecret};
///
/// let secret = WebhookSecret::new("Jefe").unwrap();
/// let signature = compute_signature(&secret, b"what do ya want for nothing?").unwrap();
/// assert_eq!(signature, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
/// ```
pub fn compute_signature(secret: &WebhookSecret, body: &[u8]) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_bytes()).map_err(|e| {
        WebhookError::InvalidSecret {
            message: e.to_string(),
        }
    })?;
    mac.update(body);

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Compare an expected signature with a provided one in constant time.
///
/// Lengths are compared first; a length mismatch reveals nothing about the
/// secret since every valid digest has the same encoded length.
pub fn signatures_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();

    if expected.len() != provided.len() {
        return false;
    }

    expected.ct_eq(provided).into()
}

/// Verify `provided` against the signature of `body` under `secret`.
///
/// A missing signature header is a mismatch, not a separate failure mode.
///
/// # Errors
///
/// Returns [`WebhookError::InvalidSignature`] when the header is missing or
/// does not match the computed digest.
pub fn verify_signature(
    secret: &WebhookSecret,
    body: &[u8],
    provided: Option<&str>,
) -> Result<(), WebhookError> {
    let provided = provided.ok_or_else(|| {
        WebhookError::InvalidSignature("missing X-Shopify-Hmac-Sha256 header".to_string())
    })?;

    let expected = compute_signature(secret, body)?;

    if signatures_match(&expected, provided) {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature(
            "HMAC-SHA256 digest does not match".to_string(),
        ))
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
