//! Device records, one per imported batch.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::sync::MutexGuard;

use crate::StoreState;

/// A stored device record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRecord {
    pub serial_number: Option<String>,
    /// Import time, in stored timestamp units.
    pub timestamp: i64,
    pub data_name: String,
    pub travel_number: Option<String>,
    pub record_count: Option<i64>,
    pub read_count: Option<i64>,
    pub max_value1: Option<f64>,
    pub min_value1: Option<f64>,
    pub max_value2: Option<f64>,
    pub min_value2: Option<f64>,
    pub sensor2_available: bool,
    pub started_at: Option<String>,
    pub warning: Option<i64>,
    pub sensor2_type: Option<String>,
}

const COLUMNS: &str = "serial_number, timestamp, data_name, travel_number, record_count, read_count, max_value1, min_value1, max_value2, min_value2, sensor2_available, started_at, warning, sensor2_type";

/// Device store with a borrowed connection.
pub struct Devices<'db> {
    state: MutexGuard<'db, StoreState>,
}

impl<'db> Devices<'db> {
    pub(crate) fn new(state: MutexGuard<'db, StoreState>) -> Self {
        Self { state }
    }

    /// Get a device record by data-set name.
    pub fn get(&self, data_name: &str) -> Result<Option<DeviceRecord>, rusqlite::Error> {
        self.state
            .conn
            .query_row(
                &format!("SELECT {} FROM device WHERE data_name = ?1", COLUMNS),
                params![data_name],
                Self::row_to_record,
            )
            .optional()
    }

    /// List all device records, oldest import first.
    pub fn list(&self) -> Result<Vec<DeviceRecord>, rusqlite::Error> {
        let mut stmt = self.state.conn.prepare(&format!(
            "SELECT {} FROM device ORDER BY timestamp, data_name",
            COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    /// Get all distinct serial numbers with readings.
    pub fn serial_numbers(&self) -> Result<Vec<String>, rusqlite::Error> {
        let mut stmt = self.state.conn.prepare(
            "SELECT DISTINCT serial_number FROM reading WHERE serial_number IS NOT NULL ORDER BY serial_number",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut serials = Vec::new();
        for row in rows {
            serials.push(row?);
        }

        Ok(serials)
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<DeviceRecord, rusqlite::Error> {
        Ok(DeviceRecord {
            serial_number: row.get(0)?,
            timestamp: row.get(1)?,
            data_name: row.get(2)?,
            travel_number: row.get(3)?,
            record_count: row.get(4)?,
            read_count: row.get(5)?,
            max_value1: row.get(6)?,
            min_value1: row.get(7)?,
            max_value2: row.get(8)?,
            min_value2: row.get(9)?,
            sensor2_available: row.get::<_, Option<bool>>(10)?.unwrap_or(false),
            started_at: row.get(11)?,
            warning: row.get(12)?,
            sensor2_type: row.get(13)?,
        })
    }
}
