//! # elitechlog-chart
//!
//! Terminal line charts of logger readings, one coloured line per device.
//!
//! The time axis is split into buckets, one per character column. Readings
//! sharing a bucket are averaged and empty buckets leave a gap. The bucket
//! count is searched so that sparse series are not cut into more pieces
//! than the data itself has.

mod bucket;
mod error;
mod labels;
mod plot;
mod series;

pub use bucket::{bucket_index, bucketize, choose_bucket_count, count_runs, worst_runs};
pub use error::ChartError;
pub use labels::{AxisLabels, MAX_DECIMALS};
pub use plot::{plot, series_color};
pub use series::{group_series, select_series, Series};

use tracing::debug;

/// Size and styling of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    /// Total width in characters, labels included.
    pub width: usize,
    /// Total height in lines.
    pub height: usize,
    pub colored: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 80,
            height: 20,
            colored: true,
        }
    }
}

/// A rendered chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub ts_min: i64,
    pub ts_max: i64,
    pub buckets: usize,
    pub labels: AxisLabels,
    pub text: String,
}

/// Render `series` into a chart.
pub fn render(series: &[Series], options: &ChartOptions) -> Result<Chart, ChartError> {
    let (ts_min, ts_max) = series
        .iter()
        .filter_map(Series::time_range)
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
        .ok_or(ChartError::NoData)?;

    let values = series.iter().flat_map(|s| s.points.iter().map(|p| p.1));
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    let rows = options.height.saturating_sub(1).max(1);
    let labels = AxisLabels::new(min, max, rows);
    let total: usize = series.iter().map(Series::len).sum();
    let max_width = options.width.saturating_sub(labels.width).min(total).max(1);
    let buckets = choose_bucket_count(series, ts_min, ts_max, max_width);
    debug!(
        series = series.len(),
        readings = total,
        buckets,
        max_width,
        "Chart layout chosen"
    );

    let columns: Vec<Vec<Option<f64>>> = series
        .iter()
        .map(|s| bucketize(s, ts_min, ts_max, buckets))
        .collect();

    Ok(Chart {
        ts_min,
        ts_max,
        buckets,
        labels,
        text: plot(&columns, rows, &labels, options.colored),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sizes_chart() {
        let series = group_series(vec![
            ("A", 0, 1.0),
            ("A", 60, 2.0),
            ("A", 120, 3.0),
            ("B", 30, 2.5),
            ("B", 90, 1.5),
        ]);
        let chart = render(
            &series,
            &ChartOptions {
                width: 200,
                height: 5,
                colored: false,
            },
        )
        .unwrap();

        assert_eq!((chart.ts_min, chart.ts_max), (0, 120));
        assert!(chart.buckets >= 3 && chart.buckets <= 5);
        let lines: Vec<&str> = chart.text.lines().collect();
        assert_eq!(lines.len(), 5);
        for line in lines {
            assert_eq!(line.chars().count(), chart.labels.width + chart.buckets);
        }
    }

    #[test]
    fn test_render_without_points() {
        assert_eq!(
            render(&[Series::new("A")], &ChartOptions::default()),
            Err(ChartError::NoData)
        );
    }
}
