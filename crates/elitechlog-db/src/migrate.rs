//! Import of batches held by an older store.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use elitechlog_transport::{load_snapshot, Parameters, TransportError};

use crate::{Database, StoreError};

/// A store of previously downloaded batches.
pub trait LegacySource {
    /// Data-set names of every batch in the source.
    fn batch_names(&self) -> Result<Vec<String>, TransportError>;

    /// Load one batch, readings included.
    fn load_batch(&self, name: &str) -> Result<Parameters, TransportError>;
}

/// A directory of device snapshot files, one batch per file.
///
/// The file stem is the data-set name of the batch.
pub struct SnapshotArchive {
    dir: PathBuf,
}

impl SnapshotArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LegacySource for SnapshotArchive {
    fn batch_names(&self) -> Result<Vec<String>, TransportError> {
        let io_err = |source| TransportError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn load_batch(&self, name: &str) -> Result<Parameters, TransportError> {
        let mut parameters = load_snapshot(&self.dir.join(format!("{}.json", name)))?;
        parameters.data_name = Some(name.to_string());
        Ok(parameters)
    }
}

/// Progress after one batch has been handled.
#[derive(Debug, Clone)]
pub struct MigrationProgress<'a> {
    /// 1-based position of the batch.
    pub index: usize,
    pub total: usize,
    pub name: &'a str,
    pub inserted: usize,
    pub skipped: usize,
}

/// Totals of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub batches: usize,
    pub inserted: usize,
    pub skipped: usize,
    /// Batches that could not be read from the source.
    pub failed: usize,
}

/// Store every batch of `source` into `db`.
///
/// With `serial`, only batches whose data-set name starts with
/// `{serial}_` are imported. Unreadable batches are counted and skipped;
/// storage errors end the run, leaving earlier batches committed.
pub fn migrate(
    db: &Database,
    source: &dyn LegacySource,
    serial: Option<&str>,
    mut progress: impl FnMut(&MigrationProgress<'_>),
) -> Result<MigrationReport, StoreError> {
    let prefix = serial.map(|s| format!("{}_", s));
    let names: Vec<String> = source
        .batch_names()
        .map_err(StoreError::Legacy)?
        .into_iter()
        .filter(|name| prefix.as_ref().map_or(true, |p| name.starts_with(p.as_str())))
        .collect();

    let total = names.len();
    let mut report = MigrationReport::default();

    for (i, name) in names.iter().enumerate() {
        let mut parameters = match source.load_batch(name) {
            Ok(parameters) => parameters,
            Err(e) => {
                warn!(batch = %name, error = %e, "Skipping unreadable batch");
                report.failed += 1;
                continue;
            }
        };

        let rows = parameters.readings.len();
        let inserted = db.store(&mut parameters)?;
        report.batches += 1;
        report.inserted += inserted;
        report.skipped += rows - inserted;

        progress(&MigrationProgress {
            index: i + 1,
            total,
            name,
            inserted,
            skipped: rows - inserted,
        });
    }

    info!(
        batches = report.batches,
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failed,
        "Migration finished"
    );
    Ok(report)
}
