//! Error types for recording and replay sessions.
//!
//! All errors implement `std::error::Error` and carry structured context for
//! logging and recovery guidance.
//!
//! ## Error Categories
//!
//! - **Configuration Errors**: invalid domain ranges, unknown backend names
//! - **Connection Errors**: backend unreachable, handshake timeout, disconnect
//! - **Invalid State Errors**: a command that is not valid in the current session state
//! - **Backend I/O Errors**: a request/response failed after the connection was established
//!
//! Configuration and invalid state errors are raised synchronously and never
//! change the session state. Connection errors always drive the session to
//! `Idle` or `Disconnected`.
//!
//! ```rust
//! use skyreel::{ErrorCategory, SessionState, SimError};
//!
//! let error = SimError::invalid_state("backward", SessionState::Stopped);
//! assert_eq!(error.category(), ErrorCategory::InvalidState);
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::SessionState;
use crate::types::GroupTag;

/// Result type alias for session operations.
pub type Result<T, E = SimError> = std::result::Result<T, E>;

/// Observable error class, as reported to session observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Connection,
    InvalidState,
    BackendIo,
}

/// Main error type for simulator sessions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SimError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Failed to connect to simulator: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("'{command}' is not valid in state {state:?}")]
    InvalidState { command: String, state: SessionState },

    #[error("Backend I/O failed during {operation}{}", for_group(.group))]
    BackendIo {
        operation: String,
        group: Option<GroupTag>,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },
}

fn for_group(group: &Option<GroupTag>) -> String {
    group.map(|g| format!(" for {g}")).unwrap_or_default()
}

impl SimError {
    /// The observable error class of this error.
    ///
    /// Timeouts are connection failures; parse failures are configuration defects.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SimError::Configuration { .. } => ErrorCategory::Configuration,
            SimError::Parse { .. } => ErrorCategory::Configuration,
            SimError::Connection { .. } => ErrorCategory::Connection,
            SimError::Timeout { .. } => ErrorCategory::Connection,
            SimError::InvalidState { .. } => ErrorCategory::InvalidState,
            SimError::BackendIo { .. } => ErrorCategory::BackendIo,
        }
    }

    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Retrying a connection error always means issuing a new `connect()`.
    pub fn is_retryable(&self) -> bool {
        match self {
            SimError::Connection { .. } => true,
            SimError::Timeout { .. } => true,
            SimError::BackendIo { .. } => true,
            SimError::Configuration { .. } => false,
            SimError::InvalidState { .. } => false,
            SimError::Parse { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SimError::Configuration { .. } => vec![
                "Check the configured backend name",
                "Verify the domain range of custom normalizations",
            ],
            SimError::Connection { .. } => vec![
                "Ensure the flight simulator is running",
                "Check that the selected backend is installed",
                "Connect again once the simulator has finished loading",
            ],
            SimError::InvalidState { .. } => vec![
                "Query the current session state before issuing commands",
                "Stop or pause the session first",
            ],
            SimError::BackendIo { .. } => vec![
                "Lower the sampling rate",
                "Check simulator performance",
                "Reconnect if failures persist",
            ],
            SimError::Timeout { .. } => vec![
                "Increase the handshake timeout",
                "Verify the simulator is responding",
            ],
            SimError::Parse { .. } => vec![
                "Check the configuration file syntax",
                "Compare against the documented configuration keys",
            ],
        }
    }

    /// Helper constructor for configuration errors.
    pub fn configuration(reason: impl Into<String>) -> Self {
        SimError::Configuration { reason: reason.into() }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        SimError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        SimError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for commands issued in the wrong state.
    pub fn invalid_state(command: impl Into<String>, state: SessionState) -> Self {
        SimError::InvalidState { command: command.into(), state }
    }

    /// Helper constructor for backend I/O errors.
    pub fn backend_io(operation: impl Into<String>, group: Option<GroupTag>) -> Self {
        SimError::BackendIo { operation: operation.into(), group }
    }
}

impl From<serde_yaml_ng::Error> for SimError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        SimError::Parse { context: "session configuration".to_string(), details: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_carry_their_context(
                reason in ".*",
                command in "\\w+",
                operation in "\\w+",
                duration_ms in 1u64..60000u64
            ) {
                let config = SimError::configuration(reason.clone());
                let connection = SimError::connection_failed(reason.clone());
                let state = SimError::invalid_state(command.clone(), SessionState::Idle);
                let io = SimError::backend_io(operation.clone(), Some(GroupTag::Light));
                let timeout = SimError::Timeout { duration: Duration::from_millis(duration_ms) };

                prop_assert!(config.to_string().contains(&reason));
                prop_assert!(connection.to_string().contains(&reason));
                prop_assert!(state.to_string().contains(&command));
                prop_assert!(io.to_string().contains(&operation));
                prop_assert!(!timeout.to_string().is_empty());
            }

            #[test]
            fn source_chain_is_preserved(base_message in ".*") {
                let source: Box<dyn std::error::Error + Send + Sync> =
                    Box::new(std::io::Error::other(base_message.clone()));
                let error = SimError::connection_failed_with_source("handshake", source);

                let inner = std::error::Error::source(&error).map(|s| s.to_string());
                prop_assert_eq!(inner, Some(base_message));
            }
        }
    }

    #[test]
    fn categories_match_taxonomy() {
        assert_eq!(SimError::configuration("x").category(), ErrorCategory::Configuration);
        assert_eq!(SimError::connection_failed("x").category(), ErrorCategory::Connection);
        assert_eq!(
            SimError::Timeout { duration: Duration::from_secs(1) }.category(),
            ErrorCategory::Connection
        );
        assert_eq!(
            SimError::invalid_state("record", SessionState::Idle).category(),
            ErrorCategory::InvalidState
        );
        assert_eq!(SimError::backend_io("request", None).category(), ErrorCategory::BackendIo);
    }

    #[test]
    fn backend_io_message_names_group() {
        let error = SimError::backend_io("request", Some(GroupTag::PrimaryFlightControl));
        assert!(error.to_string().contains("PrimaryFlightControl"));

        let error = SimError::backend_io("request", None);
        assert_eq!(error.to_string(), "Backend I/O failed during request");
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<SimError>();
    }

    #[test]
    fn recovery_methods_work() {
        let connection_error = SimError::connection_failed("test");
        let state_error = SimError::invalid_state("forward", SessionState::Recording);

        assert!(connection_error.is_retryable());
        assert!(!state_error.is_retryable());

        for suggestion in connection_error.recovery_suggestions() {
            assert!(suggestion.len() > 5);
        }
        assert!(!state_error.recovery_suggestions().is_empty());
    }

    #[test]
    fn yaml_errors_become_parse_errors() {
        let err = serde_yaml_ng::from_str::<u32>("not: [a number").unwrap_err();
        let error: SimError = err.into();
        assert!(matches!(error, SimError::Parse { .. }));
        assert_eq!(error.category(), ErrorCategory::Configuration);
    }
}
