//! Reading rows as delivered by a device download.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Seconds between 0001-01-01T00:00:00 and the Unix epoch.
///
/// Stored timestamps count whole seconds from year 1, which keeps them
/// compatible with databases written by the vendor tooling.
pub const UNIX_EPOCH_TICK_SECONDS: i64 = 62_135_596_800;

/// Convert a local wall-clock time to a stored timestamp.
pub fn to_timestamp(time: NaiveDateTime) -> i64 {
    time.and_utc().timestamp() + UNIX_EPOCH_TICK_SECONDS
}

/// Convert a stored timestamp back to local wall-clock time.
pub fn from_timestamp(ts: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(ts - UNIX_EPOCH_TICK_SECONDS, 0).map(|dt| dt.naive_utc())
}

/// Convert a field name to its storage name (`TempValue` -> `temp_value`).
///
/// Anything outside `[a-z0-9_]` is replaced, so the result is always safe
/// to splice into SQL as an identifier.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Runtime type of a measurement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// No type information; the field never carries data.
    Empty,
    Boolean,
    Integer,
    Real,
    DateTime,
    Text,
    Blob,
    Uuid,
}

/// A single measurement value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    DateTime(NaiveDateTime),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Value::Text(v) => f.write_str(v),
            Value::Blob(v) => {
                for b in v {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// A named measurement column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ValueKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Column name as stored in the reading table.
    pub fn storage_name(&self) -> String {
        to_snake_case(&self.name)
    }
}

/// One timestamped row; `values` align with [`ReadingTable::columns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub time: NaiveDateTime,
    pub values: Vec<Value>,
}

impl Reading {
    pub fn timestamp(&self) -> i64 {
        to_timestamp(self.time)
    }
}

/// Ordered readings downloaded from a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingTable {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Reading>,
}

impl ReadingTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating `values` to the column count.
    pub fn push(&mut self, time: NaiveDateTime, mut values: Vec<Value>) {
        values.resize(self.columns.len(), Value::Null);
        self.rows.push(Reading { time, values });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
