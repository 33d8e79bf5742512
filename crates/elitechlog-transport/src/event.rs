use serde::{Deserialize, Serialize};

use crate::Parameters;

/// Opaque token identifying one physical device connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionIdentity(String);

impl SessionIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Events emitted by a transport adapter.
///
/// Ordered within one adapter, unordered across adapters.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    ParametersLoaded {
        parameters: Box<Parameters>,
        identity: SessionIdentity,
    },
    DownloadProgress {
        current: usize,
        total: usize,
        message: String,
    },
    DownloadComplete {
        parameters: Box<Parameters>,
    },
    Disconnected,
    Notify {
        is_error: bool,
        message: String,
    },
}

impl TransportEvent {
    pub fn parameters_loaded(parameters: Parameters, identity: SessionIdentity) -> Self {
        TransportEvent::ParametersLoaded {
            parameters: Box::new(parameters),
            identity,
        }
    }

    pub fn download_complete(parameters: Parameters) -> Self {
        TransportEvent::DownloadComplete {
            parameters: Box::new(parameters),
        }
    }

    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::ParametersLoaded { .. } => "parameters_loaded",
            TransportEvent::DownloadProgress { .. } => "download_progress",
            TransportEvent::DownloadComplete { .. } => "download_complete",
            TransportEvent::Disconnected => "disconnected",
            TransportEvent::Notify { .. } => "notify",
        }
    }
}
