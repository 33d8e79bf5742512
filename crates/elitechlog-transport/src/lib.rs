//! # elitechlog-transport
//!
//! The contract between the session coordinator and the adapters that talk
//! to data loggers, plus the parameter and reading model they exchange.
//!
//! ## Key Types
//!
//! - [`Transport`] - Adapter for one physical channel
//! - [`TransportKind`] - Runtime tag for the channel (COM or USB)
//! - [`TransportEvent`] - Events an adapter reports
//! - [`Parameters`] - Device identity, status, configuration and readings
//! - [`ReadingTable`] - Timestamped measurement rows with typed columns
//!
//! ## Adapters
//!
//! - [`SnapshotTransport`] - Serves a device recorded in a JSON snapshot
//! - [`IdleTransport`] - A channel with nothing attached

mod event;
mod idle;
mod params;
mod readings;
mod snapshot;
mod traits;

pub use event::{SessionIdentity, TransportEvent};
pub use idle::IdleTransport;
pub use params::{
    Capabilities, DeviceConfig, DeviceStatus, Parameters, TempUnit, SENSOR_TYPE_TEMPERATURE,
    WORK_MODE_IDLE, WORK_MODE_STOPPED,
};
pub use readings::{
    from_timestamp, to_snake_case, to_timestamp, Column, Reading, ReadingTable, Value, ValueKind,
    UNIX_EPOCH_TICK_SECONDS,
};
pub use snapshot::{load_snapshot, save_snapshot, SnapshotTransport, DEFAULT_DOWNLOAD_CHUNK};
pub use traits::{EventCallback, SetMode, Transport, TransportError, TransportKind};
