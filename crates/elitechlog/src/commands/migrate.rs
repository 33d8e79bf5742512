use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use elitechlog_db::{migrate, Database, SnapshotArchive};
use elitechlog_logging::LogEvent;

use super::{parse_serial, AppContext, EXIT_OK};

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Database file
    #[arg(short, long)]
    db_file: Option<PathBuf>,

    /// Directory of exported device snapshots, one import batch per file
    #[arg(long)]
    source_dir: PathBuf,

    /// Restrict to a specific device
    #[arg(short, long, value_parser = parse_serial)]
    serial_number: Option<String>,
}

/// Import legacy batches into the database.
pub fn run(ctx: &AppContext, args: MigrateArgs) -> Result<i32> {
    if !args.source_dir.is_dir() {
        anyhow::bail!("Source directory {} not found", args.source_dir.display());
    }

    let db_path = ctx.config.db_path(args.db_file.as_deref());
    let db = Database::open_at(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let source = SnapshotArchive::new(&args.source_dir);

    let report = migrate(&db, &source, args.serial_number.as_deref(), |progress| {
        ctx.logger.log(&LogEvent::MigrationBatch {
            index: progress.index,
            total: progress.total,
            name: progress.name.to_string(),
            inserted: progress.inserted,
            skipped: progress.skipped,
        });
    })?;

    ctx.logger.log(&LogEvent::MigrationCompleted {
        batches: report.batches,
        inserted: report.inserted,
        skipped: report.skipped,
        failed: report.failed,
    });
    Ok(EXIT_OK)
}
