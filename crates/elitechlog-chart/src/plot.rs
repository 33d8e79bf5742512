//! Line drawing with box characters.

use colored::{Color, Colorize};

use crate::AxisLabels;

const PALETTE: [Color; 12] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::White,
    Color::BrightBlack,
    Color::BrightRed,
    Color::BrightGreen,
    Color::BrightYellow,
    Color::BrightBlue,
];

/// Colour of the `index`th series; stable for a given position.
pub fn series_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

#[derive(Clone, Copy)]
struct Cell {
    ch: char,
    series: Option<usize>,
}

impl Cell {
    const BLANK: Cell = Cell {
        ch: ' ',
        series: None,
    };
}

/// Draw every series of columns into one grid about `rows` lines tall.
///
/// A `None` column breaks the line. Every line is prefixed with a label and
/// the axis, `labels.width` columns in total.
pub fn plot(columns: &[Vec<Option<f64>>], rows: usize, labels: &AxisLabels, colored: bool) -> String {
    let values = columns.iter().flatten().flatten().copied();
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return String::new();
    }

    let range = max - min;
    let ratio = if range > 0.0 { rows as f64 / range } else { 1.0 };
    let min_row = (min * ratio).round() as i64;
    let max_row = (max * ratio).round() as i64;
    let height = (max_row - min_row).max(0) as usize;
    let width = columns.iter().map(Vec::len).max().unwrap_or(0);

    // Row 0 is the top line.
    let mut grid = vec![vec![Cell::BLANK; width]; height + 1];
    let level = |v: f64| ((v * ratio).round() as i64 - min_row).clamp(0, height as i64) as usize;
    let mut axis = vec!['┤'; height + 1];

    for (index, series) in columns.iter().enumerate() {
        let mut put = |y: usize, x: usize, ch: char| {
            grid[height - y][x] = Cell {
                ch,
                series: Some(index),
            };
        };

        if let Some(Some(first)) = series.first() {
            axis[height - level(*first)] = '┼';
        }

        for x in 0..series.len() {
            let current = series[x];
            let next = series.get(x + 1).copied().flatten();
            match (current, next) {
                (None, Some(n)) => put(level(n), x, '╶'),
                (None, None) => {}
                (Some(c), None) => put(level(c), x, '╴'),
                (Some(c), Some(n)) => {
                    let (y0, y1) = (level(c), level(n));
                    if y0 == y1 {
                        put(y0, x, '─');
                    } else {
                        put(y1, x, if y0 > y1 { '╰' } else { '╭' });
                        put(y0, x, if y0 > y1 { '╮' } else { '╯' });
                        for y in y0.min(y1) + 1..y0.max(y1) {
                            put(y, x, '│');
                        }
                    }
                }
            }
        }
    }

    let label_width = labels.width.saturating_sub(1);
    let mut out = String::new();
    for (row, cells) in grid.iter().enumerate() {
        let value = if height > 0 {
            max - row as f64 * range / height as f64
        } else {
            max
        };
        out.push_str(&format!("{:>w$}", labels.format(value), w = label_width));
        out.push(axis[row]);
        for cell in cells {
            match (cell.series, colored) {
                (Some(index), true) => {
                    out.push_str(&cell.ch.to_string().color(series_color(index)).to_string())
                }
                _ => out.push(cell.ch),
            }
        }
        out.push('\n');
    }
    out
}
