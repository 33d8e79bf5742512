//! Command-line verbs.

pub mod chart;
pub mod export;
pub mod info;
pub mod migrate;
pub mod pull;
pub mod reset;
pub mod set;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use elitechlog_core::{SessionCoordinator, SessionHandle, SessionListener};
use elitechlog_db::ReadingFilter;
use elitechlog_logging::{LogEvent, Logger};
use elitechlog_transport::Parameters;

use crate::config::Config;
use crate::period::parse_period;
use crate::transports::build_transports;

/// Everything a verb needs besides its own arguments.
pub struct AppContext {
    pub config: Config,
    pub logger: Arc<Logger>,
}

/// Exit code of a verb that ran to completion.
pub const EXIT_OK: i32 = 0;
/// Exit code when a query matched no readings.
pub const EXIT_NO_READINGS: i32 = 1;

pub(crate) fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Serial numbers are plain alphanumeric tokens.
pub(crate) fn parse_serial(value: &str) -> Result<String, String> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(value.to_string())
    } else {
        Err("must be alphanumeric".to_string())
    }
}

/// Build a reading filter from the shared query options.
pub(crate) fn reading_filter(
    serial_numbers: Vec<String>,
    period: Option<&str>,
) -> Result<ReadingFilter> {
    let (start, end) = match period {
        Some(text) => {
            let period = parse_period(text, now())?;
            (period.start, period.end)
        }
        None => (None, None),
    };
    Ok(ReadingFilter {
        serial_numbers,
        start,
        end,
    })
}

/// Run a device session until a listener or Ctrl+C stops it.
pub(crate) fn run_session(ctx: &AppContext, listener: Box<dyn SessionListener>) -> Result<()> {
    let transports = build_transports(&ctx.config.transports);
    let mut coordinator = SessionCoordinator::new(transports, listener);

    let interrupt = coordinator.handle();
    ctrlc::set_handler(move || interrupt.stop()).context("Failed to set Ctrl+C handler")?;

    ctx.logger.log(&LogEvent::WaitingForDevice);
    coordinator.run()?;
    Ok(())
}

/// Behaviour shared by the device verbs once their work on a device is done.
pub(crate) struct Listening {
    pub logger: Arc<Logger>,
    pub keep_listening: bool,
}

impl Listening {
    /// Stop the session, or tell the user to swap devices and keep going.
    pub fn finish(&self, session: &SessionHandle) {
        if self.keep_listening {
            self.logger.log(&LogEvent::SafeToRemove);
        } else {
            session.stop();
        }
    }

    pub fn connected(&self, parameters: &Parameters) {
        self.logger.log(&LogEvent::DeviceConnected {
            transport: parameters.kind.to_string(),
            device: parameters.identity_label().to_string(),
            record_count: parameters.status.record_count,
        });
    }

    /// The user declined a destructive command; end the session.
    pub fn declined(&self, session: &SessionHandle, action: &str) {
        self.logger.log(&LogEvent::Aborted {
            reason: format!("Declined to {}", action),
        });
        session.stop();
    }

    pub fn disconnected(&self) {
        self.logger.log(&LogEvent::DeviceDisconnected);
        if self.keep_listening {
            self.logger.log(&LogEvent::WaitingForDevice);
        }
    }
}
