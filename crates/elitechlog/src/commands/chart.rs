use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Args;
use colored::Colorize;

use elitechlog_chart::{
    group_series, render, select_series, series_color, ChartError, ChartOptions, Series,
};
use elitechlog_db::Database;
use elitechlog_transport::from_timestamp;

use super::{parse_serial, reading_filter, AppContext, EXIT_NO_READINGS, EXIT_OK};
use crate::interaction::terminal_width;

const DEFAULT_HEIGHT: usize = 20;

#[derive(Args, Debug)]
pub struct ChartArgs {
    /// Database file
    #[arg(short, long)]
    db_file: Option<PathBuf>,

    /// Restrict to specific devices
    #[arg(short, long = "serial-number", value_parser = parse_serial)]
    serial_numbers: Vec<String>,

    /// Restrict to a time period, e.g. yesterday, 'last month', 2024-01-01..2024-01-31
    #[arg(short, long)]
    period: Option<String>,

    /// Value index to display
    #[arg(short = 'i', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=9))]
    value_index: u8,

    /// Chart width in characters (default: terminal width)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(12..=1000))]
    width: Option<u16>,

    /// Chart height in characters
    #[arg(short = 'H', long, value_parser = clap::value_parser!(u16).range(2..=1000))]
    height: Option<u16>,

    /// Plot a single device; fails when the query matches several
    #[arg(long)]
    single: bool,
}

/// First line above the chart naming each device in its line colour.
fn header(series: &[Series], ts_min: i64, ts_max: i64, colored: bool) -> String {
    let names: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if colored {
                s.name.color(series_color(i)).to_string()
            } else {
                s.name.clone()
            }
        })
        .collect();

    let mut line = format!("Device(s) {}", names.join(", "));
    if let (Some(from), Some(to)) = (from_timestamp(ts_min), from_timestamp(ts_max)) {
        line.push_str(&format!(" over period {}", period_label(from, to)));
    }
    line
}

fn period_label(from: NaiveDateTime, to: NaiveDateTime) -> String {
    if from.date() == to.date() {
        format!("{} to {}", from.format("%Y-%m-%d %H:%M"), to.format("%H:%M"))
    } else {
        format!("{} to {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"))
    }
}

/// Draw stored readings as a line chart, one line per device.
pub fn run(ctx: &AppContext, args: ChartArgs) -> Result<i32> {
    let db_path = ctx.config.db_path(args.db_file.as_deref());
    let db = Database::open_existing(&db_path)?;
    let filter = reading_filter(args.serial_numbers, args.period.as_deref())?;

    let column = format!("value{}", args.value_index);
    let points = db
        .series(&filter, &column)
        .with_context(|| format!("Failed to query {}", column))?;
    let series = group_series(
        points
            .iter()
            .map(|p| (p.serial_number.as_str(), p.timestamp, p.value)),
    );

    let series = match select_series(series, args.single) {
        Ok(series) => series,
        Err(ChartError::NoData) => {
            println!("No readings found");
            return Ok(EXIT_NO_READINGS);
        }
        Err(e) => return Err(e.into()),
    };

    let options = ChartOptions {
        width: args.width.map(usize::from).unwrap_or_else(terminal_width),
        height: args
            .height
            .map(usize::from)
            .or(ctx.config.chart.height)
            .unwrap_or(DEFAULT_HEIGHT),
        colored: colored::control::SHOULD_COLORIZE.should_colorize(),
    };
    let chart = render(&series, &options)?;

    println!("{}", header(&series, chart.ts_min, chart.ts_max, options.colored));
    print!("{}", chart.text);
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_period_label() {
        assert_eq!(period_label(at(3, 8, 0), at(3, 17, 30)), "2024-06-03 08:00 to 17:30");
        assert_eq!(period_label(at(3, 8, 0), at(5, 1, 0)), "2024-06-03 to 2024-06-05");
    }

    #[test]
    fn test_plain_header() {
        let series = vec![Series::new("EL01"), Series::new("EL02")];
        let ts = elitechlog_transport::to_timestamp(at(3, 8, 0));
        assert_eq!(
            header(&series, ts, ts + 3600, false),
            "Device(s) EL01, EL02 over period 2024-06-03 08:00 to 09:00"
        );
    }
}
