use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use elitechlog_core::{SessionHandle, SessionListener};
use elitechlog_db::Database;
use elitechlog_logging::LogEvent;
use elitechlog_transport::Parameters;

use super::{now, run_session, AppContext, Listening, EXIT_OK};
use crate::interaction::describe_device;

#[derive(Args, Debug)]
pub struct PullArgs {
    /// Continue listening for another device on disconnect
    #[arg(short, long)]
    keep_listening: bool,

    /// Database file
    #[arg(short, long)]
    db_file: Option<PathBuf>,
}

/// Downloads every connected device and stores its readings.
pub(crate) struct PullListener {
    listening: Listening,
    db: Database,
}

impl PullListener {
    pub(crate) fn new(listening: Listening, db: Database) -> Self {
        Self { listening, db }
    }
}

impl SessionListener for PullListener {
    fn on_connected(&mut self, session: &SessionHandle, parameters: &Parameters) -> Result<()> {
        self.listening.connected(parameters);
        println!("{}", describe_device(parameters, now()));

        let device = parameters.identity_label().to_string();
        let record_count = parameters.status.record_count;
        if record_count == 0 {
            self.listening.logger.log(&LogEvent::NoReadings { device });
            self.listening.finish(session);
            return Ok(());
        }

        self.listening.logger.log(&LogEvent::DownloadStarted {
            device,
            record_count,
        });
        session.download()?;
        Ok(())
    }

    fn on_downloading(&mut self, _session: &SessionHandle, current: usize, total: usize) -> Result<()> {
        self.listening
            .logger
            .log(&LogEvent::DownloadProgress { current, total });
        Ok(())
    }

    fn on_downloaded(&mut self, session: &SessionHandle, parameters: &Parameters) -> Result<()> {
        let mut parameters = parameters.clone();
        let rows = parameters.readings.len();
        let inserted = self
            .db
            .store(&mut parameters)
            .with_context(|| format!("Failed to store readings of {}", parameters.identity_label()))?;

        let data_name = parameters.data_name.clone().unwrap_or_default();
        info!(%data_name, inserted, rows, "Download stored");
        self.listening.logger.log(&LogEvent::ReadingsStored {
            data_name,
            inserted,
            skipped: rows - inserted,
        });
        self.listening.finish(session);
        Ok(())
    }

    fn on_disconnected(&mut self, _session: &SessionHandle) -> Result<()> {
        self.listening.disconnected();
        Ok(())
    }
}

/// Pull the readings of the connected device into the database.
pub fn run(ctx: &AppContext, args: PullArgs) -> Result<i32> {
    let db_path = ctx.config.db_path(args.db_file.as_deref());
    let db = Database::open_at(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let listener = PullListener::new(
        Listening {
            logger: Arc::clone(&ctx.logger),
            keep_listening: args.keep_listening,
        },
        db,
    );
    run_session(ctx, Box::new(listener))?;
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use elitechlog_core::SessionCoordinator;
    use elitechlog_db::ReadingFilter;
    use elitechlog_logging::{LogFormat, Logger};
    use elitechlog_transport::{
        save_snapshot, Column, IdleTransport, SnapshotTransport, Transport, TransportKind, Value,
        ValueKind,
    };
    use std::path::Path;
    use tempfile::TempDir;

    fn write_snapshot(dir: &Path) -> PathBuf {
        let mut params = Parameters::new(TransportKind::Usb);
        params.serial_number = Some("EL0042".to_string());
        params.status.record_count = 3;
        params.readings.columns = vec![Column::new("Value1", ValueKind::Real)];
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        for i in 0..3 {
            params.readings.push(
                start + chrono::Duration::minutes(10 * i),
                vec![Value::Real(4.0 + i as f64)],
            );
        }
        let path = dir.join("usb.json");
        save_snapshot(&path, &params).unwrap();
        path
    }

    fn pull_once(snapshot: &Path, db_path: &Path) {
        let transports: Vec<Arc<dyn Transport>> = vec![
            Arc::new(IdleTransport::new(TransportKind::Com)),
            Arc::new(SnapshotTransport::new(TransportKind::Usb, snapshot).with_chunk(2)),
        ];
        let listener = PullListener::new(
            Listening {
                logger: Arc::new(Logger::to_writer(LogFormat::Json, Box::new(std::io::sink()))),
                keep_listening: false,
            },
            Database::open_at(db_path).unwrap(),
        );
        SessionCoordinator::new(transports, Box::new(listener))
            .run()
            .unwrap();
    }

    #[test]
    fn test_pull_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let snapshot = write_snapshot(dir.path());
        let db_path = dir.path().join("readings.db");

        pull_once(&snapshot, &db_path);
        pull_once(&snapshot, &db_path);

        let db = Database::open_existing(&db_path).unwrap();
        let points = db.series(&ReadingFilter::default(), "value1").unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].value, 6.0);
        assert!(!db.devices().list().unwrap().is_empty());
    }
}
