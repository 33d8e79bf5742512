use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::NaiveDate;
use elitechlog_db::Database;
use elitechlog_transport::{save_snapshot, Column, Parameters, TransportKind, Value, ValueKind};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("elitechlog.toml"), "log_format = \"compact\"\n").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        let config = self.path("elitechlog.toml");
        Command::new(env!("CARGO_BIN_EXE_elitechlog"))
            .arg("--config")
            .arg(&config)
            .args(args)
            .env("NO_COLOR", "1")
            .env("CLICOLOR", "0")
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

fn device(serial: &str, first_minute: i64, count: i64) -> Parameters {
    let mut params = Parameters::new(TransportKind::Usb);
    params.serial_number = Some(serial.to_string());
    params.status.record_count = count as u32;
    params.readings.columns = vec![Column::new("Value1", ValueKind::Real)];
    let start = NaiveDate::from_ymd_opt(2024, 2, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    for i in first_minute..first_minute + count {
        params.readings.push(
            start + chrono::Duration::minutes(i * 15),
            vec![Value::Real(3.0 + (i % 4) as f64)],
        );
    }
    params
}

fn seeded_db(path: &Path) {
    let db = Database::open_at(path).unwrap();
    db.store(&mut device("EL01", 0, 40)).unwrap();
    db.store(&mut device("EL02", 10, 40)).unwrap();
}

#[test]
fn test_missing_database_is_an_error() {
    let ws = Workspace::new();
    let db = ws.path("missing.db");
    let output = ws.run(&["export", "-d", db.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("ERROR: Database file not found"));
}

#[test]
fn test_chart_without_readings_exits_one() {
    let ws = Workspace::new();
    let db = ws.path("readings.db");
    seeded_db(&db);

    let output = ws.run(&["chart", "-d", db.to_str().unwrap(), "-s", "NOPE"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output).trim(), "No readings found");
}

#[test]
fn test_chart_renders_both_devices() {
    let ws = Workspace::new();
    let db = ws.path("readings.db");
    seeded_db(&db);

    let output = ws.run(&["chart", "-d", db.to_str().unwrap(), "-w", "60", "-H", "6"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Device(s) EL01, EL02 over period 2024-02-01 00:00 to 12:15");
    assert!(lines.len() > 2);
    assert!(lines.iter().skip(1).all(|l| l.chars().count() <= 60));
}

#[test]
fn test_single_requires_one_device() {
    let ws = Workspace::new();
    let db = ws.path("readings.db");
    seeded_db(&db);

    let output = ws.run(&["chart", "-d", db.to_str().unwrap(), "--single"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("EL01, EL02"));

    let output = ws.run(&["chart", "-d", db.to_str().unwrap(), "--single", "-s", "EL02"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
}

#[test]
fn test_export_filters_by_serial_and_period() {
    let ws = Workspace::new();
    let db = ws.path("readings.db");
    seeded_db(&db);

    let output = ws.run(&[
        "export",
        "-d",
        db.to_str().unwrap(),
        "-s",
        "EL02",
        "-p",
        "2024-02-01",
    ]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let mut reader = csv::Reader::from_reader(output.stdout.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "serial_number");
    assert_eq!(&headers[1], "timestamp");
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 40);
    assert!(rows.iter().all(|r| &r[0] == "EL02"));
}

#[test]
fn test_migrate_snapshot_directory() {
    let ws = Workspace::new();
    let source = ws.path("legacy");
    save_snapshot(&source.join("EL07_20240201.json"), &device("EL07", 0, 5)).unwrap();
    save_snapshot(&source.join("EL07_20240301.json"), &device("EL07", 3, 5)).unwrap();
    save_snapshot(&source.join("EL08_20240301.json"), &device("EL08", 0, 5)).unwrap();
    let db = ws.path("migrated.db");

    let args = [
        "migrate",
        "-d",
        db.to_str().unwrap(),
        "--source-dir",
        source.to_str().unwrap(),
        "-s",
        "EL07",
    ];
    let output = ws.run(&args);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stderr(&output).contains("migrate:done 2 batches +8 ~2 !0"));

    let output = ws.run(&args);
    assert!(stderr(&output).contains("migrate:done 2 batches +0 ~10 !0"));

    let output = ws.run(&["export", "-d", db.to_str().unwrap(), "-f", "json"]);
    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows.len(), 8);
}
