use thiserror::Error;

use elitechlog_transport::{TransportError, TransportKind};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{kind} transport reported: {message}")]
    Transport {
        kind: TransportKind,
        message: String,
    },

    #[error("Failed to start {kind} transport: {source}")]
    TransportStart {
        kind: TransportKind,
        #[source]
        source: TransportError,
    },

    #[error("{kind} command failed: {source}")]
    Command {
        kind: TransportKind,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Listener(anyhow::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A command-level parameter combination the device would not accept.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be {expected}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field} must be {max} characters at most")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} not available")]
    Unavailable(&'static str),

    #[error("Upper limit {sensor} must be greater than lower limit {sensor}")]
    LimitOrder { sensor: &'static str },

    #[error("{field} must be within the alarm range {min} to {max}")]
    OutsideAlarmRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("Device cannot be reset")]
    CannotReset,
}
