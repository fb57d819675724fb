use std::{fmt, sync::Arc};

/// Secret handed to [`GatewayClient::start`](crate::GatewayClient::start) on every attempt.
///
/// Cheap to clone. `Debug` never prints the secret.
///
/// ```
/// use gatevisor::Credential;
///
/// let token = Credential::new("s3cr3t");
/// assert_eq!(token.expose(), "s3cr3t");
/// assert!(!format!("{token:?}").contains("s3cr3t"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    /// Wraps a raw secret.
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True if the secret is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}
