//! File-backed transport serving a recorded device snapshot.
//!
//! A snapshot is the JSON form of [`Parameters`], readings included. The
//! adapter behaves like a logger that is plugged in for as long as the file
//! exists: starting it announces the device, downloads replay the stored
//! readings and parameter writes are persisted back to the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, warn};

use crate::{
    EventCallback, Parameters, SessionIdentity, SetMode, Transport, TransportError,
    TransportEvent, TransportKind, WORK_MODE_IDLE,
};

/// Default number of readings reported per progress event.
pub const DEFAULT_DOWNLOAD_CHUNK: usize = 100;

/// Read a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Parameters, TransportError> {
    let content = fs::read_to_string(path).map_err(|source| TransportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| TransportError::Snapshot {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a snapshot file, creating parent directories as needed.
pub fn save_snapshot(path: &Path, parameters: &Parameters) -> Result<(), TransportError> {
    let io_err = |source| TransportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(parameters).map_err(|source| {
        TransportError::Snapshot {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, json).map_err(io_err)
}

/// Transport adapter backed by a snapshot file.
pub struct SnapshotTransport {
    kind: TransportKind,
    path: PathBuf,
    chunk: usize,
    callback: Mutex<Option<EventCallback>>,
    // Serialises file rewrites issued from concurrent commands.
    file_lock: Arc<Mutex<()>>,
}

impl SnapshotTransport {
    pub fn new(kind: TransportKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            chunk: DEFAULT_DOWNLOAD_CHUNK,
            callback: Mutex::new(None),
            file_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Number of readings reported per progress event.
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// Identity of the device served by this adapter.
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity::new(format!("{}:{}", self.kind, self.path.display()))
    }

    fn callback(&self) -> Result<EventCallback, TransportError> {
        let guard = self
            .callback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone().ok_or(TransportError::NotStarted)
    }

    fn spawn<F>(&self, name: &str, work: F) -> Result<(), TransportError>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::Builder::new()
            .name(format!("{}-{}", self.kind, name))
            .spawn(work)
            .map(|_| ())
            .map_err(TransportError::Spawn)
    }
}

impl Transport for SnapshotTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn start(&self, callback: EventCallback) -> Result<(), TransportError> {
        *self
            .callback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(callback.clone());

        if !self.path.exists() {
            debug!(kind = %self.kind, path = %self.path.display(), "No snapshot, no device attached");
            return Ok(());
        }

        let mut parameters = load_snapshot(&self.path)?;
        parameters.kind = self.kind;
        let identity = self.identity();
        debug!(kind = %self.kind, %identity, "Announcing snapshot device");

        self.spawn("connect", move || {
            parameters.readings.clear();
            callback(TransportEvent::parameters_loaded(parameters, identity));
        })
    }

    fn download(&self, _parameters: &Parameters) -> Result<(), TransportError> {
        let callback = self.callback()?;
        let path = self.path.clone();
        let kind = self.kind;
        let chunk = self.chunk;

        self.spawn("download", move || match load_snapshot(&path) {
            Ok(mut parameters) => {
                parameters.kind = kind;
                let total = parameters.readings.len();
                let mut current = 0;
                while current < total {
                    current = (current + chunk).min(total);
                    callback(TransportEvent::DownloadProgress {
                        current,
                        total,
                        message: format!("Reading {}/{}", current, total),
                    });
                }
                callback(TransportEvent::download_complete(parameters));
            }
            Err(e) => {
                warn!(error = %e, "Snapshot download failed");
                callback(TransportEvent::Notify {
                    is_error: true,
                    message: e.to_string(),
                });
            }
        })
    }

    fn set_parameters(
        &self,
        parameters: &Parameters,
        mode: SetMode,
    ) -> Result<(), TransportError> {
        let callback = self.callback()?;
        let path = self.path.clone();
        let kind = self.kind;
        let identity = self.identity();
        let file_lock = Arc::clone(&self.file_lock);
        let requested = parameters.clone();

        self.spawn("write", move || {
            let result = {
                let _guard = file_lock.lock().unwrap_or_else(|p| p.into_inner());
                write_parameters(&path, &requested, mode)
            };
            match result {
                Ok(mut updated) => {
                    updated.kind = kind;
                    updated.readings.clear();
                    callback(TransportEvent::parameters_loaded(updated, identity));
                }
                Err(e) => callback(TransportEvent::Notify {
                    is_error: true,
                    message: e.to_string(),
                }),
            }
        })
    }
}

/// Apply a parameter write to the stored snapshot and return the result.
fn write_parameters(
    path: &Path,
    requested: &Parameters,
    mode: SetMode,
) -> Result<Parameters, TransportError> {
    let mut stored = load_snapshot(path)?;
    stored.config = requested.config.clone();

    // An empty serial in a write request leaves the device serial untouched.
    if let Some(serial) = requested.serial_number.as_deref().filter(|s| !s.is_empty()) {
        stored.serial_number = Some(serial.to_string());
    }

    if mode == SetMode::QuickReset {
        stored.readings.clear();
        stored.status.record_count = 0;
        stored.status.work_mode = WORK_MODE_IDLE;
        stored.status.started_at = None;
    }

    save_snapshot(path, &stored)?;
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, Value, ValueKind, WORK_MODE_STOPPED};
    use chrono::NaiveDate;
    use crossbeam_channel::{unbounded, Receiver};
    use std::time::Duration;

    fn snapshot_with_rows(rows: usize) -> Parameters {
        let mut params = Parameters::new(TransportKind::Usb);
        params.serial_number = Some("EL0001".to_string());
        params.status.record_count = rows as u32;
        params.status.work_mode = WORK_MODE_STOPPED;
        params.readings.columns = vec![Column::new("Value1", ValueKind::Real)];
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for i in 0..rows {
            params.readings.push(
                start + chrono::Duration::minutes(i as i64),
                vec![Value::Real(i as f64)],
            );
        }
        params
    }

    fn started(transport: &SnapshotTransport) -> Receiver<TransportEvent> {
        let (tx, rx) = unbounded();
        transport
            .start(Arc::new(move |event| {
                let _ = tx.send(event);
            }))
            .unwrap();
        rx
    }

    fn next(rx: &Receiver<TransportEvent>) -> TransportEvent {
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_missing_snapshot_means_no_device() {
        let dir = tempfile::TempDir::new().unwrap();
        let transport = SnapshotTransport::new(TransportKind::Com, dir.path().join("none.json"));
        let rx = started(&transport);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_commands_require_start() {
        let transport = SnapshotTransport::new(TransportKind::Com, "unused.json");
        let err = transport
            .download(&Parameters::new(TransportKind::Com))
            .unwrap_err();
        assert!(matches!(err, TransportError::NotStarted));
    }

    #[test]
    fn test_connect_then_download() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("device.json");
        save_snapshot(&path, &snapshot_with_rows(250)).unwrap();

        let transport = SnapshotTransport::new(TransportKind::Usb, &path).with_chunk(100);
        let rx = started(&transport);

        let params = match next(&rx) {
            TransportEvent::ParametersLoaded { parameters, identity } => {
                assert_eq!(identity, transport.identity());
                assert!(parameters.readings.is_empty());
                parameters
            }
            other => panic!("unexpected event {:?}", other),
        };

        transport.download(&params).unwrap();
        let mut progress = Vec::new();
        loop {
            match next(&rx) {
                TransportEvent::DownloadProgress { current, total, .. } => {
                    assert_eq!(total, 250);
                    progress.push(current);
                }
                TransportEvent::DownloadComplete { parameters } => {
                    assert_eq!(parameters.readings.len(), 250);
                    break;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(progress, vec![100, 200, 250]);
    }

    #[test]
    fn test_quick_reset_clears_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("device.json");
        save_snapshot(&path, &snapshot_with_rows(5)).unwrap();

        let transport = SnapshotTransport::new(TransportKind::Usb, &path);
        let rx = started(&transport);
        let TransportEvent::ParametersLoaded { mut parameters, .. } = next(&rx) else {
            panic!("expected parameters");
        };

        parameters.config.description = "Cold room".to_string();
        parameters.serial_number = Some(String::new());
        transport
            .set_parameters(&parameters, SetMode::QuickReset)
            .unwrap();

        let TransportEvent::ParametersLoaded { parameters: updated, .. } = next(&rx) else {
            panic!("expected refresh");
        };
        assert_eq!(updated.config.description, "Cold room");
        assert_eq!(updated.serial_number.as_deref(), Some("EL0001"));
        assert_eq!(updated.status.record_count, 0);
        assert_eq!(updated.status.work_mode, WORK_MODE_IDLE);

        let stored = load_snapshot(&path).unwrap();
        assert!(stored.readings.is_empty());
        assert_eq!(stored.config.description, "Cold room");
    }
}
