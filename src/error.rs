//! Error types used by the gatevisor runtime and the wrapped client.
//!
//! This module defines three enums:
//!
//! - [`ClientError`]: how a wrapped client's `start()` / `close()` ended.
//! - [`SupervisorError`]: terminal failures returned from [`Supervisor::run`](crate::Supervisor::run).
//! - [`ConfigError`]: malformed configuration input.
//!
//! Classification is explicit: [`ClientError::class`] maps every client error to a
//! [`FailureClass`], and only credential/permission failures are [`FailureClass::Fatal`].

use std::time::Duration;
use thiserror::Error;

/// Whether a failed attempt may be retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// Must not be retried; the supervisor stops and propagates.
    Fatal,
    /// Environmental or timing failure; the supervisor backs off and retries.
    Retryable,
}

/// # Errors produced by the wrapped gateway client.
///
/// Returned from [`GatewayClient::start`](crate::GatewayClient::start) when the
/// connection ends with an error, and from
/// [`GatewayClient::close`](crate::GatewayClient::close).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The gateway rejected the credential (invalid or revoked token).
    #[error("authentication rejected: {reason}")]
    AuthenticationRejected {
        /// Detail reported by the client.
        reason: String,
    },

    /// The application lacks an elevated permission/intent it asked for.
    #[error("required permission not granted: {reason}")]
    PermissionRequired {
        /// Detail reported by the client (usually the permission name).
        reason: String,
    },

    /// Any other failure (transport, TLS, protocol, ...).
    #[error("client failed: {reason}")]
    Fail {
        /// Detail reported by the client.
        reason: String,
    },
}

impl ClientError {
    /// Shorthand for [`ClientError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        ClientError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use gatevisor::ClientError;
    ///
    /// let err = ClientError::AuthenticationRejected { reason: "401".into() };
    /// assert_eq!(err.as_label(), "client_auth_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ClientError::AuthenticationRejected { .. } => "client_auth_rejected",
            ClientError::PermissionRequired { .. } => "client_permission_required",
            ClientError::Fail { .. } => "client_failed",
        }
    }

    /// Classifies the error for the retry loop.
    ///
    /// # Example
    /// ```
    /// use gatevisor::{ClientError, FailureClass};
    ///
    /// assert_eq!(ClientError::fail("reset by peer").class(), FailureClass::Retryable);
    /// let perm = ClientError::PermissionRequired { reason: "message_content".into() };
    /// assert_eq!(perm.class(), FailureClass::Fatal);
    /// ```
    pub fn class(&self) -> FailureClass {
        match self {
            ClientError::AuthenticationRejected { .. } | ClientError::PermissionRequired { .. } => {
                FailureClass::Fatal
            }
            ClientError::Fail { .. } => FailureClass::Retryable,
        }
    }

    /// Indicates whether the error is safe to retry.
    pub fn is_retryable(&self) -> bool {
        self.class() == FailureClass::Retryable
    }
}

/// # Terminal errors returned by the supervisor.
///
/// Retryable attempt failures never surface here while retries remain; they are
/// handled inside the attempt loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The credential was rejected. Fix or rotate it; retrying will not help.
    #[error("credential rejected by the gateway: {reason}")]
    AuthenticationRejected {
        /// Detail reported by the client.
        reason: String,
    },

    /// A required permission/intent is not granted to the application.
    #[error("required gateway permission not granted: {reason}")]
    PermissionRequired {
        /// Detail reported by the client.
        reason: String,
    },

    /// The configured retry limit was reached.
    #[error("gave up after {attempts} attempt(s); last failure: {last}")]
    RetriesExhausted {
        /// Number of attempts performed.
        attempts: u32,
        /// Description of the last attempt's failure.
        last: String,
    },

    /// The client failed after it had become ready.
    #[error("client exited with an error after ready: {reason}")]
    ClientExited {
        /// Detail reported by the client.
        reason: String,
    },

    /// The client task panicked after it had become ready.
    #[error("client task panicked after ready: {reason}")]
    ClientPanicked {
        /// Panic/join detail.
        reason: String,
    },
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use gatevisor::SupervisorError;
    ///
    /// let err = SupervisorError::RetriesExhausted { attempts: 3, last: "timeout".into() };
    /// assert_eq!(err.as_label(), "supervisor_retries_exhausted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::AuthenticationRejected { .. } => "supervisor_auth_rejected",
            SupervisorError::PermissionRequired { .. } => "supervisor_permission_required",
            SupervisorError::RetriesExhausted { .. } => "supervisor_retries_exhausted",
            SupervisorError::ClientExited { .. } => "supervisor_client_exited",
            SupervisorError::ClientPanicked { .. } => "supervisor_client_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SupervisorError::AuthenticationRejected { reason } => {
                format!("auth rejected: {reason}")
            }
            SupervisorError::PermissionRequired { reason } => {
                format!("permission required: {reason}")
            }
            SupervisorError::RetriesExhausted { attempts, last } => {
                format!("retries exhausted after {attempts} attempt(s): {last}")
            }
            SupervisorError::ClientExited { reason } => format!("client exited: {reason}"),
            SupervisorError::ClientPanicked { reason } => format!("client panicked: {reason}"),
        }
    }

    /// True for credential/permission failures that an operator must fix.
    pub fn is_operator_actionable(&self) -> bool {
        matches!(
            self,
            SupervisorError::AuthenticationRejected { .. }
                | SupervisorError::PermissionRequired { .. }
        )
    }
}

impl From<ClientError> for SupervisorError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::AuthenticationRejected { reason } => {
                SupervisorError::AuthenticationRejected { reason }
            }
            ClientError::PermissionRequired { reason } => {
                SupervisorError::PermissionRequired { reason }
            }
            ClientError::Fail { reason } => SupervisorError::ClientExited { reason },
        }
    }
}

/// # Errors produced while reading configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A key holds a value that cannot be used.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Configuration key.
        key: &'static str,
        /// Raw value as read.
        value: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// Formats a duration as whole-or-fractional seconds for messages.
pub(crate) fn secs(d: Duration) -> String {
    let s = d.as_secs_f64();
    if s.fract() == 0.0 {
        format!("{s:.0}s")
    } else {
        format!("{s:.3}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_credential_and_permission_are_fatal() {
        let auth = ClientError::AuthenticationRejected {
            reason: "bad token".into(),
        };
        let perm = ClientError::PermissionRequired {
            reason: "members intent".into(),
        };
        let other = ClientError::fail("tls handshake eof");

        assert_eq!(auth.class(), FailureClass::Fatal);
        assert_eq!(perm.class(), FailureClass::Fatal);
        assert_eq!(other.class(), FailureClass::Retryable);
        assert!(!auth.is_retryable());
        assert!(other.is_retryable());
    }

    #[test]
    fn client_error_maps_to_matching_supervisor_error() {
        let err: SupervisorError = ClientError::AuthenticationRejected {
            reason: "revoked".into(),
        }
        .into();
        match &err {
            SupervisorError::AuthenticationRejected { reason } => assert_eq!(reason, "revoked"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_operator_actionable());

        let err: SupervisorError = ClientError::fail("socket closed").into();
        assert_eq!(err.as_label(), "supervisor_client_exited");
        assert!(!err.is_operator_actionable());
    }

    #[test]
    fn fatal_messages_are_distinct_from_transient_ones() {
        let auth = SupervisorError::AuthenticationRejected { reason: "x".into() }.to_string();
        let perm = SupervisorError::PermissionRequired { reason: "x".into() }.to_string();
        let exhausted = SupervisorError::RetriesExhausted {
            attempts: 2,
            last: "x".into(),
        }
        .to_string();
        assert!(auth.contains("credential"));
        assert!(perm.contains("permission"));
        assert_ne!(auth, perm);
        assert!(exhausted.contains("2 attempt"));
    }

    #[test]
    fn secs_formats_whole_and_fractional() {
        assert_eq!(secs(Duration::from_secs(180)), "180s");
        assert_eq!(secs(Duration::from_millis(1500)), "1.500s");
    }
}
