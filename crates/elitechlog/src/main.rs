use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use elitechlog_logging::{init_tracing, LogFormat, Logger};

mod commands;
mod config;
mod interaction;
mod period;
mod transports;

use commands::AppContext;
use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "elitechlog",
    about = "Download, store and chart readings from Elitech data loggers",
    version,
    author
)]
struct Cli {
    /// Configuration file (default: <config dir>/elitechlog/elitechlog.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Diagnostic log level, e.g. warn, info, debug
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Progress output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatChoice>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Display status information about the connected device
    Info(commands::info::InfoArgs),
    /// Pull the latest readings from the connected device
    Pull(commands::pull::PullArgs),
    /// Set parameters on the connected device
    Set(commands::set::SetArgs),
    /// Delete all readings on the connected device
    Reset(commands::reset::ResetArgs),
    /// Display stored readings in a simple chart
    Chart(commands::chart::ChartArgs),
    /// Export stored readings
    Export(commands::export::ExportArgs),
    /// Import readings from exported device snapshots
    Migrate(commands::migrate::MigrateArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {}", error_message(&e));
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = Config::resolve(cli.config.as_deref())?;

    let format: LogFormat = cli
        .log_format
        .map(Into::into)
        .or(config.log_format)
        .unwrap_or_default();
    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "warn".to_string());
    // Dropped on return, after the verb finishes, to flush the log file.
    let _guard = init_tracing(&level, format, config.log_file.as_deref());

    let ctx = AppContext {
        config,
        logger: Arc::new(Logger::new(format)),
    };

    match cli.command {
        Command::Info(args) => commands::info::run(&ctx, args),
        Command::Pull(args) => commands::pull::run(&ctx, args),
        Command::Set(args) => commands::set::run(&ctx, args),
        Command::Reset(args) => commands::reset::run(&ctx, args),
        Command::Chart(args) => commands::chart::run(&ctx, args),
        Command::Export(args) => commands::export::run(&ctx, args),
        Command::Migrate(args) => commands::migrate::run(&ctx, args),
    }
}

/// Join the error chain, skipping causes already quoted by their parent.
fn error_message(error: &anyhow::Error) -> String {
    let mut message = String::new();
    for cause in error.chain() {
        let text = cause.to_string();
        if !message.contains(&text) {
            if !message.is_empty() {
                message.push_str(": ");
            }
            message.push_str(&text);
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_message_skips_repeated_causes() {
        let inner: Result<(), std::io::Error> = Err(std::io::Error::other("disk full"));
        let err = inner.context("Failed to store readings").unwrap_err();
        assert_eq!(error_message(&err), "Failed to store readings: disk full");

        let io = std::io::Error::other("disk full");
        let err = anyhow::Error::new(io).context("Database error: disk full");
        assert_eq!(error_message(&err), "Database error: disk full");
    }

    #[test]
    fn test_cli_parses_verbs() {
        let cli = Cli::parse_from(["elitechlog", "--log-format", "json", "chart", "-s", "EL01", "-i", "2"]);
        assert!(matches!(cli.log_format, Some(LogFormatChoice::Json)));
        assert!(matches!(cli.command, Command::Chart(_)));

        assert!(Cli::try_parse_from(["elitechlog", "chart", "-i", "10"]).is_err());
        assert!(Cli::try_parse_from(["elitechlog", "export", "-s", "EL-01"]).is_err());
        assert!(Cli::try_parse_from(["elitechlog", "migrate"]).is_err());
    }
}
