//! Reading queries for charts and exports.

use chrono::NaiveDateTime;
use rusqlite::types::ValueRef;
use serde::Serialize;

use elitechlog_transport::{to_timestamp, Value};

use crate::{Database, StoreError};

/// Filter options for reading queries.
#[derive(Debug, Default, Clone)]
pub struct ReadingFilter {
    /// Restrict to these devices; empty means all.
    pub serial_numbers: Vec<String>,
    /// Inclusive start.
    pub start: Option<NaiveDateTime>,
    /// Exclusive end.
    pub end: Option<NaiveDateTime>,
}

impl ReadingFilter {
    fn where_clause(&self) -> (String, Vec<rusqlite::types::Value>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut values = Vec::new();

        if !self.serial_numbers.is_empty() {
            let marks = vec!["?"; self.serial_numbers.len()].join(", ");
            sql.push_str(&format!(" AND serial_number IN ({})", marks));
            values.extend(
                self.serial_numbers
                    .iter()
                    .cloned()
                    .map(rusqlite::types::Value::Text),
            );
        }

        if let Some(start) = self.start {
            sql.push_str(" AND timestamp >= ?");
            values.push(rusqlite::types::Value::Integer(to_timestamp(start)));
        }

        if let Some(end) = self.end {
            sql.push_str(" AND timestamp < ?");
            values.push(rusqlite::types::Value::Integer(to_timestamp(end)));
        }

        (sql, values)
    }
}

/// One numeric reading of a device.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub serial_number: String,
    pub timestamp: i64,
    pub value: f64,
}

/// Every reading column, as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Blob(v.to_vec()),
    }
}

impl Database {
    /// Non-null values of one column, ordered by serial number then time.
    pub fn series(
        &self,
        filter: &ReadingFilter,
        column: &str,
    ) -> Result<Vec<SeriesPoint>, StoreError> {
        let state = self.state();
        if !state.schema.contains(column) {
            return Err(StoreError::UnknownColumn(column.to_string()));
        }

        let (where_sql, values) = filter.where_clause();
        // `column` is a known column name, never user text.
        let sql = format!(
            "SELECT serial_number, timestamp, {col} FROM reading{} AND {col} IS NOT NULL ORDER BY serial_number, timestamp",
            where_sql,
            col = column
        );

        let mut stmt = state.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values), |row| {
            Ok(SeriesPoint {
                serial_number: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                timestamp: row.get(1)?,
                value: row.get(2)?,
            })
        })?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row?);
        }

        Ok(points)
    }

    /// All reading columns, ordered by serial number then time.
    pub fn export(&self, filter: &ReadingFilter) -> Result<ExportTable, StoreError> {
        let state = self.state();
        let (where_sql, values) = filter.where_clause();
        let sql = format!(
            "SELECT * FROM reading{} ORDER BY serial_number, timestamp",
            where_sql
        );

        let mut stmt = state.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = stmt.query(rusqlite::params_from_iter(values))?;
        let mut table = ExportTable {
            columns,
            rows: Vec::new(),
        };
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_sql(row.get_ref(i)?));
            }
            table.rows.push(values);
        }

        Ok(table)
    }
}
