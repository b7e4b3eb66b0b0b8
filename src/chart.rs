use colored::{Color, Colorize};

/// Default width of the bar area in terminal columns.
pub const BAR_WIDTH: usize = 40;

const SERIES_COLORS: [Color; 4] = [Color::Blue, Color::Green, Color::Red, Color::Yellow];

fn bar_len(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    let len = (value / max * width as f64).round() as usize;
    // Any positive value gets at least one cell.
    len.clamp(1, width)
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(|l| l.chars().count()).max().unwrap_or(0)
}

fn pad(label: &str, width: usize) -> String {
    let n = label.chars().count();
    format!("{label}{}", " ".repeat(width.saturating_sub(n)))
}

/// Horizontal bar chart. Negative values are drawn with a shaded bar scaled
/// against the largest magnitude.
pub fn hbar(title: &str, rows: &[(String, f64)], width: usize, fmt: impl Fn(f64) -> String) -> String {
    let mut out = format!("{}\n", title.bold());
    if rows.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }
    let lw = label_width(rows.iter().map(|(l, _)| l.as_str()));
    let max = rows.iter().map(|(_, v)| v.abs()).fold(0.0, f64::max);
    for (label, value) in rows {
        let n = bar_len(value.abs(), max, width);
        let bar = if *value < 0.0 {
            "░".repeat(n).red().to_string()
        } else {
            "█".repeat(n).blue().to_string()
        };
        out.push_str(&format!(
            "  {} │{}{} {}\n",
            pad(label, lw),
            bar,
            " ".repeat(width - n),
            fmt(*value)
        ));
    }
    out
}

/// Several series per label, one bar line per series.
pub fn grouped_hbar(
    title: &str,
    labels: &[String],
    series: &[(&str, Vec<f64>)],
    width: usize,
    fmt: impl Fn(f64) -> String,
) -> String {
    let mut out = format!("{}\n", title.bold());
    if labels.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }
    let legend: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("█ {name}").color(SERIES_COLORS[i % SERIES_COLORS.len()]).to_string())
        .collect();
    out.push_str(&format!("  {}\n", legend.join("  ")));

    let lw = label_width(labels.iter().map(|l| l.as_str()));
    let max = series
        .iter()
        .flat_map(|(_, values)| values.iter().copied())
        .fold(0.0, f64::max);
    for (row, label) in labels.iter().enumerate() {
        for (i, (_, values)) in series.iter().enumerate() {
            let value = values.get(row).copied().unwrap_or(0.0);
            let n = bar_len(value, max, width);
            let shown = if i == 0 { label.as_str() } else { "" };
            out.push_str(&format!(
                "  {} │{}{} {}\n",
                pad(shown, lw),
                "█".repeat(n).color(SERIES_COLORS[i % SERIES_COLORS.len()]),
                " ".repeat(width - n),
                fmt(value)
            ));
        }
    }
    out
}

/// Position of `value` on a `width`-cell axis spanning `lo..=hi`.
fn axis_pos(value: f64, lo: f64, hi: f64, width: usize) -> usize {
    if hi <= lo || width == 0 {
        return 0;
    }
    let p = ((value - lo) / (hi - lo) * (width - 1) as f64).round();
    (p.max(0.0) as usize).min(width - 1)
}

/// One-line distribution strip: `├` at min, `●` at mean, `┤` at max.
pub fn range_strip(min: f64, mean: f64, max: f64, lo: f64, hi: f64, width: usize) -> String {
    let mut cells = vec![' '; width];
    if width == 0 {
        return String::new();
    }
    let a = axis_pos(min, lo, hi, width);
    let b = axis_pos(max, lo, hi, width);
    for cell in cells.iter_mut().take(b + 1).skip(a) {
        *cell = '─';
    }
    cells[a] = '├';
    cells[b] = '┤';
    cells[axis_pos(mean, lo, hi, width)] = '●';
    cells.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_bar_len_scales_and_floors() {
        assert_eq!(bar_len(50.0, 100.0, 40), 20);
        assert_eq!(bar_len(100.0, 100.0, 40), 40);
        assert_eq!(bar_len(0.1, 100.0, 40), 1);
        assert_eq!(bar_len(0.0, 100.0, 40), 0);
        assert_eq!(bar_len(5.0, 0.0, 40), 0);
    }

    #[test]
    fn test_hbar_renders_each_row() {
        plain();
        let rows = vec![("BEER".to_string(), 100.0), ("WINE".to_string(), 50.0)];
        let out = hbar("Revenue", &rows, 10, |v| format!("{v:.0}"));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Revenue");
        assert_eq!(lines[1], "  BEER │██████████ 100");
        assert_eq!(lines[2], "  WINE │█████      50");
    }

    #[test]
    fn test_hbar_empty() {
        plain();
        let out = hbar("Nothing", &[], 10, |v| format!("{v}"));
        assert!(out.contains("(no data)"));
    }

    #[test]
    fn test_grouped_hbar_one_line_per_series() {
        plain();
        let labels = vec!["BEER".to_string(), "FOOD".to_string()];
        let series = vec![("Revenue", vec![60.0, 40.0]), ("Orders", vec![30.0, 70.0])];
        let out = grouped_hbar("Mix", &labels, &series, 10, |v| format!("{v:.0}%"));
        // title + legend + 2 labels × 2 series
        assert_eq!(out.lines().count(), 6);
        assert!(out.contains("█ Revenue"));
    }

    #[test]
    fn test_range_strip_markers() {
        assert_eq!(range_strip(0.0, 5.0, 10.0, 0.0, 10.0, 11), "├────●────┤");
        assert_eq!(range_strip(2.0, 2.0, 2.0, 0.0, 10.0, 11).trim(), "●");
        assert_eq!(range_strip(0.0, 0.0, 0.0, 0.0, 0.0, 3), "●  ");
    }
}
