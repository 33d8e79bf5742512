use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::ser::{Serialize, SerializeMap, Serializer};

use elitechlog_db::{Database, ExportTable};
use elitechlog_transport::Value;

use super::{parse_serial, reading_filter, AppContext, EXIT_NO_READINGS, EXIT_OK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Yaml,
    Json,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Database file
    #[arg(short, long)]
    db_file: Option<PathBuf>,

    /// Restrict to a specific device
    #[arg(short, long, value_parser = parse_serial)]
    serial_number: Option<String>,

    /// Restrict to a time period, e.g. yesterday, 'last month', 2024-01-01..2024-01-31
    #[arg(short, long)]
    period: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: ExportFormat,
}

/// One reading as a map of its non-null columns, in column order.
struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = || {
            self.columns
                .iter()
                .zip(self.values)
                .filter(|(_, value)| !value.is_null())
        };
        let mut map = serializer.serialize_map(Some(present().count()))?;
        for (name, value) in present() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn records(table: &ExportTable) -> Vec<Record<'_>> {
    table
        .rows
        .iter()
        .map(|values| Record {
            columns: &table.columns,
            values,
        })
        .collect()
}

/// Write `table` to `out` in `format`.
pub fn write_table(table: &ExportTable, format: ExportFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(&table.columns)?;
            for row in &table.rows {
                writer.write_record(row.iter().map(Value::to_string))?;
            }
            writer.flush()?;
        }
        ExportFormat::Yaml => serde_yaml::to_writer(out, &records(table))?,
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &records(table))?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Export stored readings, ordered by device and time.
pub fn run(ctx: &AppContext, args: ExportArgs) -> Result<i32> {
    let db_path = ctx.config.db_path(args.db_file.as_deref());
    let db = Database::open_existing(&db_path)?;
    let filter = reading_filter(args.serial_number.into_iter().collect(), args.period.as_deref())?;

    let table = db.export(&filter).context("Failed to query readings")?;
    if table.rows.is_empty() {
        println!("No readings found");
        return Ok(EXIT_NO_READINGS);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_table(&table, args.format, &mut out)?;
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ExportTable {
        ExportTable {
            columns: vec![
                "serial_number".to_string(),
                "timestamp".to_string(),
                "value1".to_string(),
                "note".to_string(),
            ],
            rows: vec![
                vec![
                    Value::Text("EL01".to_string()),
                    Value::Integer(63_842_025_600),
                    Value::Real(4.5),
                    Value::Null,
                ],
                vec![
                    Value::Text("EL01".to_string()),
                    Value::Integer(63_842_026_200),
                    Value::Real(-1.25),
                    Value::Text("door open, 2 min".to_string()),
                ],
            ],
        }
    }

    fn render(format: ExportFormat) -> String {
        let mut out = Vec::new();
        write_table(&table(), format, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_csv_quotes_and_keeps_nulls_as_empty() {
        assert_eq!(
            render(ExportFormat::Csv),
            "serial_number,timestamp,value1,note\n\
             EL01,63842025600,4.5,\n\
             EL01,63842026200,-1.25,\"door open, 2 min\"\n"
        );
    }

    #[test]
    fn test_json_omits_nulls_and_keeps_column_order() {
        let text = render(ExportFormat::Json);
        let rows: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].get("note").is_none());
        assert_eq!(rows[1]["note"], "door open, 2 min");
        assert!(text.find("\"timestamp\"").unwrap() < text.find("\"value1\"").unwrap());
    }

    #[test]
    fn test_yaml_is_a_sequence_of_maps() {
        let rows: Vec<serde_yaml::Mapping> = serde_yaml::from_str(&render(ExportFormat::Yaml)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 4);
    }
}
