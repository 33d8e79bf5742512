//! Time periods given on the command line.
//!
//! Accepted forms:
//!
//! - `today`, `yesterday`
//! - `this week`, `last week`, `this month`, `last month`, `this year`, `last year`
//! - `last N hours`, `last N days`, `last N weeks`
//! - `YYYY-MM-DD`, one whole day
//! - `YYYY-MM-DD..YYYY-MM-DD`, both days included; either side may be empty

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PeriodError {
    #[error("Could not parse period '{0}'")]
    Unrecognized(String),

    #[error("Period '{0}' ends before it starts")]
    Reversed(String),
}

/// A half-open range of local time; `None` leaves that side unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Period {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl Period {
    fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    fn days(first: NaiveDate, last_exclusive: NaiveDate) -> Self {
        Self::between(midnight(first), midnight(last_exclusive))
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        month_start(date.year() + 1, 1)
    } else {
        month_start(date.year(), date.month() + 1)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parse `input` relative to the local time `now`.
pub fn parse_period(input: &str, now: NaiveDateTime) -> Result<Period, PeriodError> {
    let unrecognized = || PeriodError::Unrecognized(input.to_string());
    let normalized = input.trim().to_lowercase();
    let words: Vec<&str> = normalized.split_whitespace().collect();
    let today = now.date();

    let period = match words.as_slice() {
        ["today"] => Period::days(today, today + Duration::days(1)),
        ["yesterday"] => Period::days(today - Duration::days(1), today),
        [which @ ("this" | "last"), unit] => {
            let back = *which == "last";
            match *unit {
                "week" => {
                    let monday =
                        today - Duration::days(today.weekday().num_days_from_monday() as i64);
                    let start = if back { monday - Duration::weeks(1) } else { monday };
                    Period::days(start, start + Duration::weeks(1))
                }
                "month" => {
                    let this = month_start(today.year(), today.month()).ok_or_else(unrecognized)?;
                    let start = if back {
                        (this - Duration::days(1)).with_day(1).ok_or_else(unrecognized)?
                    } else {
                        this
                    };
                    Period::days(start, next_month(start).ok_or_else(unrecognized)?)
                }
                "year" => {
                    let year = if back { today.year() - 1 } else { today.year() };
                    let start = month_start(year, 1).ok_or_else(unrecognized)?;
                    let end = month_start(year + 1, 1).ok_or_else(unrecognized)?;
                    Period::days(start, end)
                }
                _ => return Err(unrecognized()),
            }
        }
        ["last", count, unit] => {
            let count: i64 = count
                .parse()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(unrecognized)?;
            let span = match unit.trim_end_matches('s') {
                "hour" => Duration::try_hours(count),
                "day" => Duration::try_days(count),
                "week" => Duration::try_weeks(count),
                _ => return Err(unrecognized()),
            }
            .ok_or_else(unrecognized)?;
            let start = now.checked_sub_signed(span).ok_or_else(unrecognized)?;
            Period::between(start, now)
        }
        [single] if single.contains("..") => {
            let (from, to) = single.split_once("..").ok_or_else(unrecognized)?;
            let start = match from {
                "" => None,
                s => Some(midnight(parse_date(s).ok_or_else(unrecognized)?)),
            };
            let end = match to {
                "" => None,
                s => Some(midnight(parse_date(s).ok_or_else(unrecognized)? + Duration::days(1))),
            };
            Period { start, end }
        }
        [single] => {
            let day = parse_date(single).ok_or_else(unrecognized)?;
            Period::days(day, day + Duration::days(1))
        }
        _ => return Err(unrecognized()),
    };

    if let (Some(start), Some(end)) = (period.start, period.end) {
        if end <= start {
            return Err(PeriodError::Reversed(input.to_string()));
        }
    }
    Ok(period)
}
