#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use elitechlog_core::{SessionHandle, SessionListener};
use elitechlog_transport::{
    EventCallback, Parameters, SessionIdentity, SetMode, Transport, TransportError,
    TransportEvent, TransportKind,
};

/// Marker notice that makes [`Recorder`] stop the session.
pub const END: &str = "__end__";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Download(String),
    Set(String, SetMode),
}

/// Transport driven by the test through [`FakeTransport::emit`].
pub struct FakeTransport {
    kind: TransportKind,
    callback: Mutex<Option<EventCallback>>,
    pub commands: Mutex<Vec<Command>>,
    pub fail_commands: bool,
}

impl FakeTransport {
    pub fn new(kind: TransportKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            callback: Mutex::new(None),
            commands: Mutex::new(Vec::new()),
            fail_commands: false,
        })
    }

    pub fn failing(kind: TransportKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            callback: Mutex::new(None),
            commands: Mutex::new(Vec::new()),
            fail_commands: true,
        })
    }

    pub fn is_started(&self) -> bool {
        self.callback.lock().unwrap().is_some()
    }

    pub fn emit(&self, event: TransportEvent) {
        let callback = self.callback.lock().unwrap().clone().expect("not started");
        callback(event);
    }

    pub fn connect(&self, serial: &str) {
        self.emit(TransportEvent::parameters_loaded(
            device(self.kind, serial),
            identity(serial),
        ));
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn start(&self, callback: EventCallback) -> Result<(), TransportError> {
        *self.callback.lock().unwrap() = Some(callback);
        Ok(())
    }

    fn download(&self, parameters: &Parameters) -> Result<(), TransportError> {
        if self.fail_commands {
            return Err(TransportError::CommandFailed("port closed".to_string()));
        }
        self.commands
            .lock()
            .unwrap()
            .push(Command::Download(parameters.identity_label().to_string()));
        Ok(())
    }

    fn set_parameters(&self, parameters: &Parameters, mode: SetMode) -> Result<(), TransportError> {
        if self.fail_commands {
            return Err(TransportError::CommandFailed("port closed".to_string()));
        }
        self.commands.lock().unwrap().push(Command::Set(
            parameters.config.description.clone(),
            mode,
        ));
        Ok(())
    }
}

pub fn device(kind: TransportKind, serial: &str) -> Parameters {
    let mut params = Parameters::new(kind);
    params.serial_number = Some(serial.to_string());
    params
}

pub fn identity(serial: &str) -> SessionIdentity {
    SessionIdentity::new(format!("dev:{}", serial))
}

pub fn end_marker() -> TransportEvent {
    TransportEvent::Notify {
        is_error: false,
        message: END.to_string(),
    }
}

/// Wait until every transport has been started by the run loop.
pub fn wait_started(transports: &[&FakeTransport]) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !transports.iter().all(|t| t.is_started()) {
        assert!(Instant::now() < deadline, "transports were not started");
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Listener callbacks as observed by a test.
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Connected(TransportKind, String),
    Updated(TransportKind, String),
    Downloading(usize, usize),
    Downloaded(TransportKind, String),
    Disconnected,
    Notice(String),
}

/// Listener that records callbacks and stops on the [`END`] notice.
#[derive(Clone, Default)]
pub struct Recorder {
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

impl Recorder {
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn push(&self, item: Seen) {
        self.seen.lock().unwrap().push(item);
    }
}

impl SessionListener for Recorder {
    fn on_connected(&mut self, _session: &SessionHandle, p: &Parameters) -> anyhow::Result<()> {
        self.push(Seen::Connected(p.kind, p.identity_label().to_string()));
        Ok(())
    }

    fn on_updated(&mut self, _session: &SessionHandle, p: &Parameters) -> anyhow::Result<()> {
        self.push(Seen::Updated(p.kind, p.identity_label().to_string()));
        Ok(())
    }

    fn on_downloading(
        &mut self,
        _session: &SessionHandle,
        current: usize,
        total: usize,
    ) -> anyhow::Result<()> {
        self.push(Seen::Downloading(current, total));
        Ok(())
    }

    fn on_downloaded(&mut self, _session: &SessionHandle, p: &Parameters) -> anyhow::Result<()> {
        self.push(Seen::Downloaded(p.kind, p.identity_label().to_string()));
        Ok(())
    }

    fn on_disconnected(&mut self, _session: &SessionHandle) -> anyhow::Result<()> {
        self.push(Seen::Disconnected);
        Ok(())
    }

    fn on_notice(&mut self, session: &SessionHandle, message: &str) -> anyhow::Result<()> {
        if message == END {
            session.stop();
        } else {
            self.push(Seen::Notice(message.to_string()));
        }
        Ok(())
    }
}
