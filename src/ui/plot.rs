use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Columns used by the line itself; `0` plots one column per sample.
    pub width: usize,
    /// Rows spanned between the lowest and highest sample.
    pub height: usize,
    /// Decimal places of the axis labels.
    pub precision: usize,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 100,
            height: 10,
            precision: 3,
        }
    }
}

/// Renders `series` as an ASCII line chart with a labelled y axis.
/// Returns one string per row, top row first.
pub fn plot(series: &[f64], opts: &PlotOptions) -> Vec<String> {
    if series.is_empty() {
        return Vec::new();
    }

    let data = if opts.width > 0 && series.len() != opts.width {
        interpolate(series, opts.width)
    } else {
        series.to_vec()
    };

    let (min, max) = data
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = max - min;
    let (rows, ratio) = if span > 0.0 {
        let rows = opts.height.max(1);
        (rows, rows as f64 / span)
    } else {
        (0, 0.0)
    };

    let labels: Vec<String> = (0..=rows)
        .map(|r| {
            let value = if rows > 0 {
                max - r as f64 * span / rows as f64
            } else {
                max
            };
            format!("{:.*}", opts.precision, value)
        })
        .collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let offset = label_width + 3;

    let mut grid = vec![vec![' '; offset + data.len()]; rows + 1];
    for (r, label) in labels.iter().enumerate() {
        let pad = label_width - label.chars().count() + 1;
        for (i, ch) in label.chars().enumerate() {
            grid[r][pad + i] = ch;
        }
        grid[r][offset - 1] = '┤';
    }

    let row_of = |value: f64| -> usize {
        let level = ((value - min) * ratio).round().clamp(0.0, rows as f64) as usize;
        rows - level
    };

    grid[row_of(data[0])][offset - 1] = '┼';

    for (x, pair) in data.windows(2).enumerate() {
        let col = offset + x;
        let (y0, y1) = (row_of(pair[0]), row_of(pair[1]));
        if y0 == y1 {
            grid[y0][col] = '─';
            continue;
        }
        // Rows grow downwards, so a smaller row index is a higher price.
        if y1 < y0 {
            grid[y0][col] = '╯';
            grid[y1][col] = '╭';
        } else {
            grid[y0][col] = '╮';
            grid[y1][col] = '╰';
        }
        for row in grid.iter_mut().take(y0.max(y1)).skip(y0.min(y1) + 1) {
            row[col] = '│';
        }
    }

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect()
}

/// Linear resampling of `data` onto `width` evenly spaced points.
fn interpolate(data: &[f64], width: usize) -> Vec<f64> {
    if data.len() == 1 || width == 1 {
        return vec![data[data.len() - 1]; width];
    }

    let step = (data.len() - 1) as f64 / (width - 1) as f64;
    (0..width)
        .map(|i| {
            let pos = i as f64 * step;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(data.len() - 1);
            let frac = pos - lo as f64;
            data[lo] + (data[hi] - data[lo]) * frac
        })
        .collect()
}
