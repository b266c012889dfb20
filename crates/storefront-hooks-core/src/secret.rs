//! Secure container for the shared webhook secret.
//!
//! The secret is loaded once at process start and handed to the
//! [`WebhookVerifier`](crate::webhook::WebhookVerifier). It is never logged and
//! its memory is wiped when the last copy is dropped.

use std::fmt;
use zeroize::Zeroizing;

/// Shared secret used as the HMAC-SHA256 key for webhook signatures.
///
/// An empty value is not a usable secret, so the constructors return `None`
/// for it. Callers treat `None` as "secret not configured", which fails
/// closed at request time.
///
/// # Examples
///
/// ```rust
/// use storefront_hooks_core::WebhookSecret;
///
/// assert!(WebhookSecret::new("").is_none());
///
/// let secret = WebhookSecret::new("abc123").unwrap();
/// assert_eq!(secret.len(), 6);
/// assert!(!format!("{:?}", secret).contains("abc123"));
/// ```
#[derive(Clone)]
pub struct WebhookSecret {
    inner: Zeroizing<String>,
}

impl WebhookSecret {
    /// Wrap a secret value, returning `None` when it is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = Zeroizing::new(value.into());
        if value.is_empty() {
            return None;
        }

        Some(Self { inner: value })
    }

    /// Read the secret from an environment variable.
    ///
    /// Returns `None` when the variable is unset, not valid unicode, or empty.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().and_then(Self::new)
    }

    /// Get secret as string (only for immediate use)
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// Get secret as bytes, the form used as the HMAC key
    pub fn expose_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Get secret length without exposing content
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Always `false`; empty secrets are rejected at construction
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSecret")
            .field("length", &self.len())
            .field("value", &"<REDACTED>")
            .finish()
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
