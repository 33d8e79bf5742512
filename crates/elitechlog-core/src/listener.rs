use anyhow::Result;

use elitechlog_transport::Parameters;

use crate::SessionHandle;

/// Receives session lifecycle notifications.
///
/// All callbacks run on the thread blocked in
/// [`SessionCoordinator::run`](crate::SessionCoordinator::run), one at a
/// time. Returning an error ends the run and the error is handed back to
/// the caller of `run`.
pub trait SessionListener {
    /// A device was bound to the idle session.
    fn on_connected(&mut self, _session: &SessionHandle, _parameters: &Parameters) -> Result<()> {
        Ok(())
    }

    /// The bound device reported fresh parameters, usually after a write.
    fn on_updated(&mut self, _session: &SessionHandle, _parameters: &Parameters) -> Result<()> {
        Ok(())
    }

    fn on_downloading(
        &mut self,
        _session: &SessionHandle,
        _current: usize,
        _total: usize,
    ) -> Result<()> {
        Ok(())
    }

    /// A download finished; `parameters` carries the readings.
    fn on_downloaded(&mut self, _session: &SessionHandle, _parameters: &Parameters) -> Result<()> {
        Ok(())
    }

    /// The bound device went away; the session is idle again.
    fn on_disconnected(&mut self, _session: &SessionHandle) -> Result<()> {
        Ok(())
    }

    /// Informational message from an adapter.
    fn on_notice(&mut self, _session: &SessionHandle, _message: &str) -> Result<()> {
        Ok(())
    }
}
