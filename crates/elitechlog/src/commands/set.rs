use std::sync::Arc;

use anyhow::Result;
use clap::{Args, ValueEnum};

use elitechlog_core::{SessionHandle, SessionListener, SettingsChange};
use elitechlog_logging::LogEvent;
use elitechlog_transport::{Parameters, TempUnit};

use super::{now, run_session, AppContext, Listening, EXIT_OK};
use crate::interaction::{confirm, describe_device};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TempUnitArg {
    C,
    F,
}

impl From<TempUnitArg> for TempUnit {
    fn from(unit: TempUnitArg) -> Self {
        match unit {
            TempUnitArg::C => TempUnit::C,
            TempUnitArg::F => TempUnit::F,
        }
    }
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Continue listening for another device on disconnect
    #[arg(short, long)]
    keep_listening: bool,

    /// Suppress confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Trip description, 100 characters at most
    #[arg(long)]
    description: Option<String>,

    /// Temperature unit shown by the device
    #[arg(long, value_enum)]
    temp_unit: Option<TempUnitArg>,

    /// Logging interval, e.g. 5m
    #[arg(long)]
    interval: Option<humantime::Duration>,

    /// Start delay, in half-hour steps below 16h
    #[arg(long)]
    delay: Option<humantime::Duration>,

    /// Allow stopping with the button
    #[arg(long)]
    button_stop: Option<bool>,

    #[arg(long)]
    device_address: Option<u8>,

    #[arg(long)]
    key_tone: Option<bool>,

    #[arg(long)]
    alarm_tone_beeps: Option<u8>,

    #[arg(long)]
    alarm_tone_interval: Option<humantime::Duration>,

    /// Overwrite the oldest readings when storage is full
    #[arg(long)]
    storage_loop: Option<bool>,

    /// Display timeout; 0s turns the display off where supported
    #[arg(long)]
    display_time: Option<humantime::Duration>,

    /// Logging interval while out of limits, at most 5m
    #[arg(long)]
    shortened_interval: Option<humantime::Duration>,

    /// Upper temperature limit in the device unit
    #[arg(long, allow_negative_numbers = true)]
    temp_upper_limit: Option<f64>,

    /// Lower temperature limit in the device unit
    #[arg(long, allow_negative_numbers = true)]
    temp_lower_limit: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    temp_calibration: Option<f64>,

    #[arg(long)]
    humidity_upper_limit: Option<f64>,

    #[arg(long)]
    humidity_lower_limit: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    humidity_calibration: Option<f64>,
}

impl SetArgs {
    fn change(&self) -> SettingsChange {
        let to_std = |d: &Option<humantime::Duration>| -> Option<std::time::Duration> {
            d.as_ref().map(|d| **d)
        };
        SettingsChange {
            description: self.description.clone(),
            temp_unit: self.temp_unit.map(Into::into),
            interval: to_std(&self.interval),
            start_delay: to_std(&self.delay),
            button_stop: self.button_stop,
            device_address: self.device_address,
            key_tone: self.key_tone,
            alarm_tone_beeps: self.alarm_tone_beeps,
            alarm_tone_interval: to_std(&self.alarm_tone_interval),
            storage_loop: self.storage_loop,
            display_time: to_std(&self.display_time),
            shortened_interval: to_std(&self.shortened_interval),
            temp_upper_limit: self.temp_upper_limit,
            temp_lower_limit: self.temp_lower_limit,
            temp_calibration: self.temp_calibration,
            humidity_upper_limit: self.humidity_upper_limit,
            humidity_lower_limit: self.humidity_lower_limit,
            humidity_calibration: self.humidity_calibration,
        }
    }
}

struct SetListener {
    listening: Listening,
    change: SettingsChange,
    yes: bool,
}

impl SessionListener for SetListener {
    fn on_connected(&mut self, session: &SessionHandle, parameters: &Parameters) -> Result<()> {
        self.listening.connected(parameters);
        println!("{}", describe_device(parameters, now()));
        self.change.validate(parameters)?;

        let action = "set device parameters";
        if !confirm(self.yes, action, parameters.status.record_count)? {
            self.listening.declined(session, action);
            return Ok(());
        }

        session.modify_parameters(|p| self.change.apply(p));
        session.update_parameters()?;
        Ok(())
    }

    fn on_updated(&mut self, session: &SessionHandle, parameters: &Parameters) -> Result<()> {
        self.listening.logger.log(&LogEvent::DeviceUpdated {
            device: parameters.identity_label().to_string(),
        });
        self.listening.finish(session);
        Ok(())
    }

    fn on_disconnected(&mut self, _session: &SessionHandle) -> Result<()> {
        self.listening.disconnected();
        Ok(())
    }
}

/// Write configuration changes to the connected device.
pub fn run(ctx: &AppContext, args: SetArgs) -> Result<i32> {
    let change = args.change();
    change.check_ranges()?;
    if change == SettingsChange::default() {
        anyhow::bail!("No parameters to set");
    }

    let listener = SetListener {
        listening: Listening {
            logger: Arc::clone(&ctx.logger),
            keep_listening: args.keep_listening,
        },
        change,
        yes: args.yes,
    };
    run_session(ctx, Box::new(listener))?;
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::time::Duration;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: SetArgs,
    }

    fn parse(argv: &[&str]) -> SetArgs {
        Harness::parse_from(std::iter::once("set").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_flags_map_to_change() {
        let args = parse(&[
            "-y",
            "--interval",
            "5m",
            "--delay",
            "1h 30min",
            "--temp-unit",
            "f",
            "--temp-lower-limit",
            "-4",
            "--key-tone",
            "false",
        ]);
        assert!(args.yes);

        let change = args.change();
        assert_eq!(change.interval, Some(Duration::from_secs(300)));
        assert_eq!(change.start_delay, Some(Duration::from_secs(5400)));
        assert_eq!(change.temp_unit, Some(TempUnit::F));
        assert_eq!(change.temp_lower_limit, Some(-4.0));
        assert_eq!(change.key_tone, Some(false));
        assert_eq!(change.description, None);
    }

    #[test]
    fn test_out_of_range_rejected_before_session() {
        let change = parse(&["--interval", "2s"]).change();
        assert!(change.check_ranges().is_err());
    }
}
