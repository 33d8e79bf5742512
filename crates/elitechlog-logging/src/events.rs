use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Mutex;

/// Structured log events for device sessions and imports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    WaitingForDevice,
    DeviceConnected {
        transport: String,
        device: String,
        record_count: u32,
    },
    DeviceUpdated {
        device: String,
    },
    DeviceDisconnected,
    DownloadStarted {
        device: String,
        record_count: u32,
    },
    DownloadProgress {
        current: usize,
        total: usize,
    },
    ReadingsStored {
        data_name: String,
        inserted: usize,
        skipped: usize,
    },
    SafeToRemove,
    NoReadings {
        device: String,
    },
    Aborted {
        reason: String,
    },
    MigrationBatch {
        index: usize,
        total: usize,
        name: String,
        inserted: usize,
        skipped: usize,
    },
    MigrationCompleted {
        batches: usize,
        inserted: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Width of the pretty download bar, in characters.
const BAR_WIDTH: usize = 30;

/// Logger for user-facing progress, written to stderr by default
pub struct Logger {
    format: LogFormat,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self::to_writer(format, Box::new(std::io::stderr()))
    }

    /// Create a logger writing to `out` instead of stderr
    pub fn to_writer(format: LogFormat, out: Box<dyn Write + Send>) -> Self {
        Self {
            format,
            out: Mutex::new(out),
        }
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn log(&self, event: &LogEvent) {
        let line = match self.format {
            LogFormat::Json => match serde_json::to_string(event) {
                Ok(line) => Some(line),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to serialize log event");
                    None
                }
            },
            LogFormat::Pretty => Self::pretty(event),
            LogFormat::Compact => Self::compact(event),
        };
        let Some(line) = line else {
            return;
        };

        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        // Progress redraws its own line until the download completes.
        let redraw = matches!(
            event,
            LogEvent::DownloadProgress { current, total } if self.format == LogFormat::Pretty && current < total
        );
        let _ = if redraw {
            write!(out, "\r{}", line)
        } else if self.format == LogFormat::Pretty
            && matches!(event, LogEvent::DownloadProgress { .. })
        {
            writeln!(out, "\r{}", line)
        } else {
            writeln!(out, "{}", line)
        };
        let _ = out.flush();
    }

    fn pretty(event: &LogEvent) -> Option<String> {
        let line = match event {
            LogEvent::WaitingForDevice => format!("{} Waiting for device...", "…".dimmed()),
            LogEvent::DeviceConnected {
                transport,
                device,
                record_count,
            } => format!(
                "{} Connected {} via {} ({} records)",
                "●".bright_green(),
                device.bold(),
                transport.to_uppercase(),
                record_count
            ),
            LogEvent::DeviceUpdated { device } => {
                format!("{} Parameters of {} updated", "✓".bright_green(), device.bold())
            }
            LogEvent::DeviceDisconnected => format!("{} Device disconnected", "○".dimmed()),
            LogEvent::DownloadStarted {
                device,
                record_count,
            } => format!(
                "{} Downloading {} records from {}",
                "▶".bright_cyan(),
                record_count,
                device.bold()
            ),
            LogEvent::DownloadProgress { current, total } => {
                let filled = if *total > 0 {
                    (current * BAR_WIDTH / total).min(BAR_WIDTH)
                } else {
                    BAR_WIDTH
                };
                format!(
                    "  [{}{}] {}/{}",
                    "#".repeat(filled).bright_cyan(),
                    " ".repeat(BAR_WIDTH - filled),
                    current,
                    total
                )
            }
            LogEvent::ReadingsStored {
                inserted, skipped, ..
            } => format!(
                "{} Inserted {}, skipped {}",
                "✓".bright_green(),
                inserted,
                skipped
            ),
            LogEvent::SafeToRemove => {
                format!("{} Safe to remove the device", "✓".bright_green())
            }
            LogEvent::NoReadings { device } => {
                format!("{} No readings on {}", "⚠".bright_yellow(), device.bold())
            }
            LogEvent::Aborted { reason } => {
                format!("{} {}", "✗".bright_red(), reason.bright_red())
            }
            LogEvent::MigrationBatch {
                index,
                total,
                name,
                inserted,
                ..
            } => format!(
                "  {} {} {}",
                format!("[{}/{}]", index, total).dimmed(),
                name,
                format!("+{}", inserted).green()
            ),
            LogEvent::MigrationCompleted {
                inserted,
                skipped,
                failed,
                ..
            } => {
                let mut line = format!(
                    "{} Inserted {}, skipped {}",
                    "✓".bright_green(),
                    inserted,
                    skipped
                );
                if *failed > 0 {
                    line.push_str(&format!(", {} unreadable", failed).bright_red().to_string());
                }
                line
            }
        };
        Some(line)
    }

    fn compact(event: &LogEvent) -> Option<String> {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::WaitingForDevice => format!("[{}] device:wait", timestamp),
            LogEvent::DeviceConnected {
                transport,
                device,
                record_count,
            } => format!(
                "[{}] device:connect:{} {} records={}",
                timestamp, transport, device, record_count
            ),
            LogEvent::DeviceUpdated { device } => {
                format!("[{}] device:update:{}", timestamp, device)
            }
            LogEvent::DeviceDisconnected => format!("[{}] device:disconnect", timestamp),
            LogEvent::DownloadStarted {
                device,
                record_count,
            } => format!(
                "[{}] download:start:{} records={}",
                timestamp, device, record_count
            ),
            // Only the final progress step is worth a line.
            LogEvent::DownloadProgress { current, total } if current < total => return None,
            LogEvent::DownloadProgress { total, .. } => {
                format!("[{}] download:done {}", timestamp, total)
            }
            LogEvent::ReadingsStored {
                data_name,
                inserted,
                skipped,
            } => format!(
                "[{}] store:{} +{} ~{}",
                timestamp, data_name, inserted, skipped
            ),
            LogEvent::SafeToRemove => format!("[{}] device:safe_to_remove", timestamp),
            LogEvent::NoReadings { device } => format!("[{}] device:empty:{}", timestamp, device),
            LogEvent::Aborted { reason } => format!("[{}] abort:{}", timestamp, reason),
            LogEvent::MigrationBatch {
                index,
                total,
                name,
                inserted,
                skipped,
            } => format!(
                "[{}] migrate:{}/{}:{} +{} ~{}",
                timestamp, index, total, name, inserted, skipped
            ),
            LogEvent::MigrationCompleted {
                batches,
                inserted,
                skipped,
                failed,
            } => format!(
                "[{}] migrate:done {} batches +{} ~{} !{}",
                timestamp, batches, inserted, skipped, failed
            ),
        };
        Some(msg)
    }
}
