use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use elitechlog_transport::{
    EventCallback, Parameters, SessionIdentity, SetMode, Transport, TransportEvent, TransportKind,
};

use crate::error::SessionError;
use crate::listener::SessionListener;

/// Messages delivered to the run loop.
enum Signal {
    Event {
        source: TransportKind,
        event: TransportEvent,
    },
    Stop,
}

/// The bound device, if any.
#[derive(Default)]
struct SessionState {
    identity: Option<SessionIdentity>,
    owner: Option<TransportKind>,
    parameters: Option<Parameters>,
}

impl SessionState {
    fn clear(&mut self) {
        self.identity = None;
        self.owner = None;
        self.parameters = None;
    }
}

/// Outcome of a `ParametersLoaded` event against the current state.
enum Binding {
    Connected,
    Refreshed,
    Ignored,
}

struct Shared {
    state: Mutex<SessionState>,
    transports: Vec<Arc<dyn Transport>>,
    signals: Sender<Signal>,
    stopped: AtomicBool,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        // State is plain data; a panic mid-update cannot leave it torn.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transport(&self, kind: TransportKind) -> Option<&Arc<dyn Transport>> {
        self.transports.iter().find(|t| t.kind() == kind)
    }
}

/// Cloneable handle for issuing commands against the current session.
///
/// Usable from listeners, from other threads and from interrupt handlers.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<Shared>,
}

impl SessionHandle {
    /// Request a download from the bound device.
    ///
    /// Returns `Ok(false)` when no device is bound.
    pub fn download(&self) -> Result<bool, SessionError> {
        self.dispatch(|transport, parameters| transport.download(parameters))
    }

    /// Write the cached parameters to the bound device.
    pub fn update_parameters(&self) -> Result<bool, SessionError> {
        self.dispatch(|transport, parameters| {
            transport.set_parameters(parameters, SetMode::Configure)
        })
    }

    /// Write the cached parameters and clear the device's readings.
    pub fn quick_reset(&self) -> Result<bool, SessionError> {
        self.dispatch(|transport, parameters| {
            transport.set_parameters(parameters, SetMode::QuickReset)
        })
    }

    /// Edit the cached parameters of the bound device in place.
    ///
    /// Returns `None` when no device is bound.
    pub fn modify_parameters<R>(&self, edit: impl FnOnce(&mut Parameters) -> R) -> Option<R> {
        self.shared.state().parameters.as_mut().map(edit)
    }

    pub fn identity(&self) -> Option<SessionIdentity> {
        self.shared.state().identity.clone()
    }

    /// Wake the run loop and make it return. Idempotent.
    pub fn stop(&self) {
        if !self.shared.stopped.swap(true, Ordering::SeqCst) {
            debug!("Session stop requested");
        }
        let _ = self.shared.signals.send(Signal::Stop);
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    fn dispatch<F>(&self, command: F) -> Result<bool, SessionError>
    where
        F: FnOnce(&dyn Transport, &Parameters) -> Result<(), elitechlog_transport::TransportError>,
    {
        let state = self.shared.state();
        let (Some(owner), Some(parameters)) = (state.owner, state.parameters.as_ref()) else {
            debug!("No device bound, command ignored");
            return Ok(false);
        };
        let Some(transport) = self.shared.transport(owner) else {
            warn!(kind = %owner, "No adapter registered for bound device");
            return Ok(false);
        };
        command(transport.as_ref(), parameters)
            .map(|_| true)
            .map_err(|source| SessionError::Command {
                kind: owner,
                source,
            })
    }
}

/// Presents one logical device session over several transport adapters.
///
/// Adapter callbacks only enqueue events; all state changes and listener
/// calls happen on the thread blocked in [`run`](Self::run), so at most one
/// device identity is ever bound.
pub struct SessionCoordinator {
    shared: Arc<Shared>,
    signals: Receiver<Signal>,
    listener: Box<dyn SessionListener>,
}

impl SessionCoordinator {
    pub fn new(transports: Vec<Arc<dyn Transport>>, listener: Box<dyn SessionListener>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                transports,
                signals: tx,
                stopped: AtomicBool::new(false),
            }),
            signals: rx,
            listener,
        }
    }

    /// Get a handle for commands and for stopping the run loop.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Start every adapter and block until stopped or a fatal error occurs.
    ///
    /// Errors raised by listeners or reported by adapters are returned here.
    /// A stopped coordinator stays stopped; later calls return immediately.
    pub fn run(&mut self) -> Result<(), SessionError> {
        for transport in &self.shared.transports {
            let kind = transport.kind();
            let tx = self.shared.signals.clone();
            let callback: EventCallback = Arc::new(move |event| {
                let _ = tx.send(Signal::Event {
                    source: kind,
                    event,
                });
            });
            transport
                .start(callback)
                .map_err(|source| SessionError::TransportStart { kind, source })?;
            debug!(%kind, "Transport started");
        }

        let handle = self.handle();
        while !handle.is_stopped() {
            let Ok(signal) = self.signals.recv() else {
                break;
            };
            if handle.is_stopped() {
                break;
            }
            match signal {
                Signal::Stop => break,
                Signal::Event { source, event } => {
                    if let Err(e) = self.handle_event(&handle, source, event) {
                        handle.stop();
                        return Err(e);
                    }
                }
            }
        }

        debug!("Session run loop finished");
        Ok(())
    }

    fn handle_event(
        &mut self,
        session: &SessionHandle,
        source: TransportKind,
        event: TransportEvent,
    ) -> Result<(), SessionError> {
        debug!(kind = %source, event = event.name(), "Transport event");

        match event {
            TransportEvent::ParametersLoaded {
                mut parameters,
                identity,
            } => {
                parameters.kind = source;
                match self.bind(source, &identity, &parameters) {
                    Binding::Connected => {
                        info!(kind = %source, %identity, serial = parameters.identity_label(), "Device connected");
                        self.listener
                            .on_connected(session, &parameters)
                            .map_err(SessionError::Listener)
                    }
                    Binding::Refreshed => self
                        .listener
                        .on_updated(session, &parameters)
                        .map_err(SessionError::Listener),
                    Binding::Ignored => {
                        debug!(kind = %source, %identity, "Another device is already bound, ignoring");
                        Ok(())
                    }
                }
            }
            TransportEvent::DownloadProgress { current, total, .. } => {
                if !self.is_owner(source) {
                    return Ok(());
                }
                self.listener
                    .on_downloading(session, current, total)
                    .map_err(SessionError::Listener)
            }
            TransportEvent::DownloadComplete { mut parameters } => {
                if !self.is_owner(source) {
                    debug!(kind = %source, "Download from unbound transport ignored");
                    return Ok(());
                }
                parameters.kind = source;
                self.listener
                    .on_downloaded(session, &parameters)
                    .map_err(SessionError::Listener)
            }
            TransportEvent::Disconnected => {
                let cleared = {
                    let mut state = self.shared.state();
                    if state.owner == Some(source) {
                        state.clear();
                        true
                    } else {
                        false
                    }
                };
                if cleared {
                    info!(kind = %source, "Device disconnected");
                    self.listener
                        .on_disconnected(session)
                        .map_err(SessionError::Listener)
                } else {
                    debug!(kind = %source, "Disconnect from unbound transport ignored");
                    Ok(())
                }
            }
            TransportEvent::Notify { is_error, message } => {
                if is_error {
                    warn!(kind = %source, %message, "Transport fault");
                    return Err(SessionError::Transport {
                        kind: source,
                        message,
                    });
                }
                info!(kind = %source, %message, "Transport notice");
                self.listener
                    .on_notice(session, &message)
                    .map_err(SessionError::Listener)
            }
        }
    }

    fn bind(
        &self,
        source: TransportKind,
        identity: &SessionIdentity,
        parameters: &Parameters,
    ) -> Binding {
        let mut state = self.shared.state();
        let same_device = state.identity.as_ref().map(|bound| bound == identity);
        match same_device {
            Some(true) => {
                // The device moved channels; commands follow the latest report.
                state.owner = Some(source);
                state.parameters = Some(parameters.clone());
                Binding::Refreshed
            }
            Some(false) => Binding::Ignored,
            None => {
                state.identity = Some(identity.clone());
                state.owner = Some(source);
                state.parameters = Some(parameters.clone());
                Binding::Connected
            }
        }
    }

    fn is_owner(&self, source: TransportKind) -> bool {
        self.shared.state().owner == Some(source)
    }
}
