//! Mapping readings onto chart columns.

use crate::Series;

/// Column of `ts` when `[ts_min, ts_max]` is split into `buckets` columns.
///
/// The last reading lands in the last column rather than one past it.
pub fn bucket_index(ts: i64, ts_min: i64, ts_max: i64, buckets: usize) -> usize {
    if buckets == 0 || ts_max <= ts_min {
        return 0;
    }
    let offset = i128::from(ts.clamp(ts_min, ts_max) - ts_min);
    let span = i128::from(ts_max - ts_min);
    let index = offset * buckets as i128 / span;
    (index as usize).min(buckets - 1)
}

/// Average the values of `series` per column; empty columns are `None`.
pub fn bucketize(series: &Series, ts_min: i64, ts_max: i64, buckets: usize) -> Vec<Option<f64>> {
    let mut sums = vec![(0.0, 0usize); buckets];
    if buckets == 0 {
        return Vec::new();
    }
    for &(ts, value) in &series.points {
        let slot = &mut sums[bucket_index(ts, ts_min, ts_max, buckets)];
        slot.0 += value;
        slot.1 += 1;
    }
    sums.into_iter()
        .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
        .collect()
}

/// Number of maximal runs of consecutive filled columns.
pub fn count_runs(columns: &[Option<f64>]) -> usize {
    let mut runs = 0;
    let mut inside = false;
    for column in columns {
        match (column.is_some(), inside) {
            (true, false) => {
                runs += 1;
                inside = true;
            }
            (false, _) => inside = false,
            _ => {}
        }
    }
    runs
}

/// Largest run count of any series at `buckets` columns.
pub fn worst_runs(series: &[Series], ts_min: i64, ts_max: i64, buckets: usize) -> usize {
    series
        .iter()
        .map(|s| count_runs(&bucketize(s, ts_min, ts_max, buckets)))
        .max()
        .unwrap_or(0)
}

/// Pick the number of chart columns, at most `max_width`.
///
/// Scanning up from the longest series, the width grows for as long as no
/// series breaks into more runs than the fewest seen so far, so sparse data
/// is not split into gaps that only come from rounding.
pub fn choose_bucket_count(series: &[Series], ts_min: i64, ts_max: i64, max_width: usize) -> usize {
    let longest = series.iter().map(Series::len).max().unwrap_or(0).max(1);
    if longest >= max_width {
        return max_width;
    }

    let mut fewest: Option<usize> = None;
    for buckets in longest..=max_width {
        let runs = worst_runs(series, ts_min, ts_max, buckets);
        match fewest {
            Some(min) if runs > min => return buckets - 1,
            Some(min) => fewest = Some(min.min(runs)),
            None => fewest = Some(runs),
        }
    }
    max_width
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(name: &str, ts: &[i64]) -> Series {
        Series {
            name: name.to_string(),
            points: ts.iter().map(|&t| (t, t as f64)).collect(),
        }
    }

    #[test]
    fn test_bucket_index_bounds() {
        assert_eq!(bucket_index(0, 0, 100, 10), 0);
        assert_eq!(bucket_index(55, 0, 100, 10), 5);
        assert_eq!(bucket_index(100, 0, 100, 10), 9);
        assert_eq!(bucket_index(42, 42, 42, 10), 0);
    }

    #[test]
    fn test_bucketize_averages_and_gaps() {
        let s = Series {
            name: "A".to_string(),
            points: vec![(0, 1.0), (1, 3.0), (9, 5.0)],
        };
        let columns = bucketize(&s, 0, 9, 3);
        assert_eq!(columns, vec![Some(2.0), None, Some(5.0)]);
        assert_eq!(count_runs(&columns), 2);
    }

    #[test]
    fn test_count_runs() {
        assert_eq!(count_runs(&[]), 0);
        assert_eq!(count_runs(&[None, None]), 0);
        assert_eq!(count_runs(&[Some(1.0), Some(1.0), None, Some(2.0)]), 2);
    }

    #[test]
    fn test_evenly_spaced_stays_contiguous() {
        let s = vec![series("A", &[0, 10, 20])];
        let buckets = choose_bucket_count(&s, 0, 20, 200);
        assert_eq!(buckets, 3);
        assert_eq!(worst_runs(&s, 0, 20, buckets), 1);
    }

    #[test]
    fn test_width_limit_wins() {
        let ts: Vec<i64> = (0..50).collect();
        let s = vec![series("A", &ts)];
        assert_eq!(choose_bucket_count(&s, 0, 49, 20), 20);
    }

    #[test]
    fn test_two_devices_three_samples() {
        let s = vec![
            series("A", &[0, 600, 1200]),
            series("B", &[300, 900, 1500]),
        ];
        let buckets = choose_bucket_count(&s, 0, 1500, 200);
        assert!(buckets >= 3);
        for one in &s {
            assert!(count_runs(&bucketize(one, 0, 1500, buckets)) <= 3);
        }
    }
}
