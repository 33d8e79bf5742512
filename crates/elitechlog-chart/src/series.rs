use crate::ChartError;

/// Timestamped values of one device, in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(i64, f64)>,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First and last timestamp.
    pub fn time_range(&self) -> Option<(i64, i64)> {
        Some((self.points.first()?.0, self.points.last()?.0))
    }
}

/// Group `(name, timestamp, value)` rows ordered by name into series.
pub fn group_series<I, S>(rows: I) -> Vec<Series>
where
    I: IntoIterator<Item = (S, i64, f64)>,
    S: AsRef<str>,
{
    let mut series: Vec<Series> = Vec::new();
    for (name, ts, value) in rows {
        let name = name.as_ref();
        match series.last_mut() {
            Some(current) if current.name == name => current.points.push((ts, value)),
            _ => {
                let mut next = Series::new(name);
                next.points.push((ts, value));
                series.push(next);
            }
        }
    }
    series
}

/// Keep the series to plot.
///
/// With `single`, exactly one series must remain; when several do, their
/// names are reported so the caller can narrow the query.
pub fn select_series(series: Vec<Series>, single: bool) -> Result<Vec<Series>, ChartError> {
    let series: Vec<Series> = series.into_iter().filter(|s| !s.is_empty()).collect();
    if series.is_empty() {
        return Err(ChartError::NoData);
    }
    if single && series.len() > 1 {
        return Err(ChartError::Ambiguous {
            candidates: series.into_iter().map(|s| s.name).collect(),
        });
    }
    Ok(series)
}
