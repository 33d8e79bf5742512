use crate::{EventCallback, Parameters, SetMode, Transport, TransportError, TransportKind};

/// Adapter for a channel with nothing attached. It never emits events and
/// rejects commands, which keeps the coordinator's dispatch total.
pub struct IdleTransport {
    kind: TransportKind,
}

impl IdleTransport {
    pub fn new(kind: TransportKind) -> Self {
        Self { kind }
    }
}

impl Transport for IdleTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn start(&self, _callback: EventCallback) -> Result<(), TransportError> {
        Ok(())
    }

    fn download(&self, _parameters: &Parameters) -> Result<(), TransportError> {
        Err(TransportError::CommandFailed(format!(
            "no device attached to {}",
            self.kind
        )))
    }

    fn set_parameters(
        &self,
        _parameters: &Parameters,
        _mode: SetMode,
    ) -> Result<(), TransportError> {
        Err(TransportError::CommandFailed(format!(
            "no device attached to {}",
            self.kind
        )))
    }
}
