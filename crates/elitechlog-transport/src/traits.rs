use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::{Parameters, TransportEvent};

/// Errors raised by a transport adapter when starting or issuing a command.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to access snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to spawn transport thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Transport has not been started")]
    NotStarted,

    #[error("Device command failed: {0}")]
    CommandFailed(String),
}

/// Callback through which an adapter reports [`TransportEvent`]s.
///
/// Adapters may invoke it from any thread they own, at any time after
/// [`Transport::start`] returns.
pub type EventCallback = Arc<dyn Fn(TransportEvent) + Send + Sync>;

/// The two physical channels a logger can be reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Com,
    Usb,
}

impl TransportKind {
    pub const ALL: [TransportKind; 2] = [TransportKind::Com, TransportKind::Usb];
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Com => write!(f, "com"),
            TransportKind::Usb => write!(f, "usb"),
        }
    }
}

/// How a parameter write should be applied by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Write the configuration as-is.
    Configure,
    /// Write the configuration and clear all stored readings.
    QuickReset,
}

/// A transport adapter owning one physical channel.
///
/// Commands are requests: they return once the request is accepted and the
/// outcome is reported later through the [`EventCallback`] given to `start`.
pub trait Transport: Send + Sync {
    /// The channel this adapter serves.
    fn kind(&self) -> TransportKind;

    /// Begin listening for devices. Must not block.
    fn start(&self, callback: EventCallback) -> Result<(), TransportError>;

    /// Request a download of all readings held by the device.
    fn download(&self, parameters: &Parameters) -> Result<(), TransportError>;

    /// Request a parameter write.
    fn set_parameters(&self, parameters: &Parameters, mode: SetMode)
        -> Result<(), TransportError>;
}
