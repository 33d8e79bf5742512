/// Most decimals an axis label gets, however flat the data.
pub const MAX_DECIMALS: usize = 6;

/// Precision and width of the value axis labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisLabels {
    pub decimals: usize,
    /// Columns taken by a label plus the axis line.
    pub width: usize,
}

impl AxisLabels {
    /// Size labels for values in `[min, max]` drawn over `rows` rows.
    ///
    /// Labels start with one decimal and gain digits while one row covers
    /// less than the last printed digit.
    pub fn new(min: f64, max: f64, rows: usize) -> Self {
        let magnitude = min.abs().max(max.abs()).max(1.0);
        let mut width = 7 + magnitude.log10().floor() as usize + usize::from(min < 0.0);
        let mut decimals = 1;

        let range = max - min;
        let rows = rows as f64;
        if range < rows {
            let extra = if range > 0.0 {
                ((rows / range).log10().ceil() as i64 - 1).max(0) as usize
            } else {
                0
            };
            let extra = extra.min(MAX_DECIMALS - decimals);
            decimals += extra;
            width += extra;
        }

        Self { decimals, width }
    }

    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimals, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_range_keeps_one_decimal() {
        let labels = AxisLabels::new(-5.0, 30.0, 19);
        assert_eq!(labels.decimals, 1);
        assert_eq!(labels.width, 9);
        assert_eq!(labels.format(12.345), "12.3");
    }

    #[test]
    fn test_narrow_range_adds_decimals() {
        let labels = AxisLabels::new(4.0, 4.5, 19);
        // 19 rows over 0.5 needs 0.01 steps.
        assert_eq!(labels.decimals, 2);
        assert_eq!(labels.width, 8);

        let tiny = AxisLabels::new(1.0, 1.0001, 999);
        assert_eq!(tiny.decimals, MAX_DECIMALS);
    }

    #[test]
    fn test_flat_series() {
        let labels = AxisLabels::new(3.0, 3.0, 19);
        assert_eq!(labels.decimals, 1);
        assert_eq!(labels.width, 7);
    }
}
