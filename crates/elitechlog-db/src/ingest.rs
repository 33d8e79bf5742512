//! Idempotent ingestion of downloaded readings.

use chrono::{Local, NaiveDateTime};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter};
use tracing::{debug, info};

use elitechlog_transport::{to_timestamp, Parameters, Value};

use crate::schema::sql_type;
use crate::{Database, StoreError};

/// Rows written per transaction.
pub const BATCH_SIZE: usize = 1000;

pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Data-set name for a batch imported at `now`.
pub fn default_data_name(parameters: &Parameters, now: NaiveDateTime) -> String {
    format!("{}_{}", parameters.identity_label(), now.format("%Y%m%d%H%M%S"))
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(v) => SqlValue::Integer(i64::from(*v)),
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::DateTime(v) => SqlValue::Text(v.format(DATETIME_FORMAT).to_string()),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Blob(v) => SqlValue::Blob(v.clone()),
    }
}

impl Database {
    /// Store a downloaded batch and return the number of readings inserted.
    ///
    /// The device record is keyed by the data-set name, which is derived and
    /// written back into `parameters` when absent, so storing the same
    /// parameters again is a no-op. Readings already present for the same
    /// serial number and timestamp are skipped. A device without a serial
    /// number is keyed by its identity label, never by NULL.
    pub fn store(&self, parameters: &mut Parameters) -> Result<usize, StoreError> {
        let data_name = match parameters.data_name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => {
                let name = default_data_name(parameters, Local::now().naive_local());
                parameters.data_name = Some(name.clone());
                name
            }
        };

        let mut guard = self.state();
        let state = &mut *guard;
        let status = &parameters.status;
        let readings = &parameters.readings;
        let serial = parameters.identity_label().to_string();

        state.conn.execute(
            r#"
            INSERT OR IGNORE INTO device (serial_number, timestamp, data_name, travel_number, record_count, read_count, max_value1, min_value1, max_value2, min_value2, sensor2_available, started_at, warning, sensor2_type)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                serial,
                to_timestamp(Local::now().naive_local()),
                data_name,
                status.travel_number.clone().unwrap_or_default(),
                status.record_count,
                readings.len() as i64,
                status.max_value1,
                status.min_value1,
                status.max_value2,
                status.min_value2,
                status.sensor2_available,
                status.started_at.map(|t| t.format(DATETIME_FORMAT).to_string()),
                status.alarm_status,
                status.sensor2_type(),
            ],
        )?;

        // Positions of the incoming columns that are stored, with their names.
        let mut stored: Vec<(usize, String)> = Vec::new();
        for (index, column) in readings.columns.iter().enumerate() {
            let Some(declared) = sql_type(column.kind) else {
                continue;
            };
            let name = column.storage_name();
            if name.is_empty()
                || name == "serial_number"
                || name == "timestamp"
                || stored.iter().any(|(_, n)| *n == name)
            {
                continue;
            }
            if !state.schema.contains(&name) {
                debug!(column = %name, declared, "Adding reading column");
                state.schema.add(&state.conn, &name, declared)?;
            }
            stored.push((index, name));
        }

        let names: Vec<&str> = ["serial_number", "timestamp"]
            .into_iter()
            .chain(stored.iter().map(|(_, n)| n.as_str()))
            .collect();
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT OR IGNORE INTO reading ({}) VALUES ({})",
            names.join(", "),
            placeholders
        );

        let serial = SqlValue::Text(serial);
        let mut inserted = 0;

        for chunk in readings.rows.chunks(BATCH_SIZE) {
            let tx = state.conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(&sql)?;
                for row in chunk {
                    let values = [serial.clone(), SqlValue::Integer(row.timestamp())]
                        .into_iter()
                        .chain(stored.iter().map(|(index, _)| {
                            row.values.get(*index).map_or(SqlValue::Null, to_sql_value)
                        }));
                    inserted += stmt.execute(params_from_iter(values))?;
                }
            }
            tx.commit()?;
            debug!(%data_name, rows = chunk.len(), "Committed reading batch");
        }

        if inserted > 0 {
            state.conn.execute_batch("VACUUM")?;
        }

        info!(
            %data_name,
            inserted,
            skipped = readings.len() - inserted,
            columns = stored.len(),
            "Readings stored"
        );
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use elitechlog_transport::{Column, TransportKind, ValueKind};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_default_data_name() {
        let mut params = Parameters::new(TransportKind::Usb);
        params.model = Some("RC-5".to_string());
        assert_eq!(default_data_name(&params, at(9, 30)), "RC-5_20240501093000");

        params.serial_number = Some("EL01".to_string());
        assert_eq!(default_data_name(&params, at(9, 30)), "EL01_20240501093000");
    }

    #[test]
    fn test_sql_value_conversion() {
        assert_eq!(to_sql_value(&Value::Boolean(true)), SqlValue::Integer(1));
        assert_eq!(
            to_sql_value(&Value::DateTime(at(12, 5))),
            SqlValue::Text("2024-05-01 12:05:00".to_string())
        );
        assert_eq!(to_sql_value(&Value::Null), SqlValue::Null);
    }

    #[test]
    fn test_store_derives_and_keeps_data_name() {
        let db = Database::open_in_memory().unwrap();
        let mut params = Parameters::new(TransportKind::Com);
        params.serial_number = Some("EL01".to_string());
        params.readings.columns = vec![Column::new("Value1", ValueKind::Real)];
        params.readings.push(at(10, 0), vec![Value::Real(3.5)]);

        assert_eq!(db.store(&mut params).unwrap(), 1);
        let name = params.data_name.clone().unwrap();
        assert!(name.starts_with("EL01_"));

        assert_eq!(db.store(&mut params).unwrap(), 0);
        assert_eq!(params.data_name.as_deref(), Some(name.as_str()));
        assert_eq!(db.devices().list().unwrap().len(), 1);
    }

    #[test]
    fn test_store_model_only_device_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let mut params = Parameters::new(TransportKind::Usb);
        params.model = Some("RC-5".to_string());
        params.readings.columns = vec![Column::new("Value1", ValueKind::Real)];
        params.readings.push(at(10, 0), vec![Value::Real(3.5)]);
        params.readings.push(at(10, 5), vec![Value::Real(3.6)]);

        assert_eq!(db.store(&mut params).unwrap(), 2);
        assert_eq!(db.store(&mut params).unwrap(), 0);

        let state = db.state();
        let (rows, serial): (i64, String) = state
            .conn
            .query_row(
                "SELECT COUNT(*), MIN(serial_number) FROM reading",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(rows, 2);
        assert_eq!(serial, "RC-5");
    }

    #[test]
    fn test_empty_and_reserved_columns_are_skipped() {
        let db = Database::open_in_memory().unwrap();
        let mut params = Parameters::new(TransportKind::Usb);
        params.serial_number = Some("EL02".to_string());
        params.readings.columns = vec![
            Column::new("Unused", ValueKind::Empty),
            Column::new("Timestamp", ValueKind::Integer),
            Column::new("Value1", ValueKind::Real),
            Column::new("value1", ValueKind::Text),
        ];
        params.readings.push(
            at(10, 0),
            vec![
                Value::Null,
                Value::Integer(7),
                Value::Real(1.0),
                Value::Text("dup".to_string()),
            ],
        );

        assert_eq!(db.store(&mut params).unwrap(), 1);
        let state = db.state();
        assert!(!state.schema.contains("unused"));
        assert_eq!(state.schema.declared_type("value1"), Some("REAL"));
        assert_eq!(state.schema.len(), 3);
    }
}
