//! Known columns of the reading table.

use std::collections::HashMap;

use rusqlite::Connection;

use elitechlog_transport::ValueKind;

/// Declared SQLite type for a measurement kind; `None` for fields that
/// never carry data.
pub(crate) fn sql_type(kind: ValueKind) -> Option<&'static str> {
    match kind {
        ValueKind::Empty => None,
        ValueKind::Boolean | ValueKind::Integer => Some("INTEGER"),
        ValueKind::Real => Some("REAL"),
        ValueKind::DateTime => Some("DATETIME"),
        ValueKind::Blob | ValueKind::Uuid => Some("BLOB"),
        ValueKind::Text => Some("TEXT"),
    }
}

/// Reading columns by storage name, with their declared type.
///
/// Loaded once when the database is opened and extended as new measurement
/// fields are added, so the type of a field is inferred only the first
/// time it is seen.
#[derive(Debug, Default)]
pub(crate) struct ReadingSchema {
    columns: HashMap<String, String>,
}

impl ReadingSchema {
    pub(crate) fn load(conn: &Connection) -> Result<Self, rusqlite::Error> {
        let mut stmt = conn.prepare("PRAGMA table_info(reading)")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;

        let mut columns = HashMap::new();
        for row in rows {
            let (name, declared) = row?;
            columns.insert(name, declared);
        }
        Ok(Self { columns })
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub(crate) fn declared_type(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.columns.len()
    }

    /// Add a column to the table and remember it.
    pub(crate) fn add(
        &mut self,
        conn: &Connection,
        name: &str,
        declared: &'static str,
    ) -> Result<(), rusqlite::Error> {
        // `name` is a storage name, restricted to [a-z0-9_].
        conn.execute_batch(&format!(
            "ALTER TABLE reading ADD COLUMN {} {}",
            name, declared
        ))?;
        self.columns.insert(name.to_string(), declared.to_string());
        Ok(())
    }
}
