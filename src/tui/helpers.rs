//! TUI rendering helper functions

use ratatui::style::Color;
use smallvec::SmallVec;

use super::constants::{SERIES_COLORS, chart};
use crate::series::Series;

// ============================================================================
// Chart Data Types
// ============================================================================

/// Stack-allocated lines for the usual handful of hosts per cluster
pub type ChartLines = SmallVec<[ChartLine; 8]>;

/// Stack-allocated points; the default history is 20 samples
pub type PointVec = SmallVec<[(f64, f64); 32]>;

/// One legend entry and its points
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine {
    pub name: String,
    pub color: Color,
    pub points: PointVec,
}

/// Lines plus the y range they cover
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub lines: ChartLines,
    /// Number of x positions (the longest line)
    pub width: usize,
    pub y_min: f64,
    pub y_max: f64,
}

impl ChartData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Y bounds rounded out to readable numbers; always spans zero
    #[must_use]
    pub fn y_bounds(&self) -> [f64; 2] {
        let lower = if self.y_min < 0.0 {
            -round_up_axis(-self.y_min)
        } else {
            0.0
        };
        [lower, round_up_axis(self.y_max)]
    }

    /// X bounds covering every point
    #[must_use]
    pub fn x_bounds(&self) -> [f64; 2] {
        [0.0, self.width.saturating_sub(1).max(1) as f64]
    }
}

/// Build chart data from named series
///
/// Colors follow input order, so the same name keeps its color as long as
/// the set of series does not change.
pub fn build_chart_data<'a>(named: impl IntoIterator<Item = (&'a str, &'a Series)>) -> ChartData {
    named.into_iter().enumerate().fold(
        ChartData {
            y_min: f64::MAX,
            y_max: f64::MIN,
            ..ChartData::default()
        },
        |mut data, (index, (name, series))| {
            let points: PointVec = series.chart_points().into_iter().collect();
            data.width = data.width.max(points.len());
            data.y_min = data.y_min.min(series.min_value() as f64);
            data.y_max = data.y_max.max(series.max_value() as f64);
            data.lines.push(ChartLine {
                name: truncate_legend(name, chart::LEGEND_WIDTH),
                color: series_color(index),
                points,
            });
            data
        },
    )
    .normalized()
}

impl ChartData {
    fn normalized(mut self) -> Self {
        if self.lines.is_empty() {
            self.y_min = 0.0;
            self.y_max = 0.0;
        }
        self
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Color for a series by index (round-robin through palette)
#[inline]
#[must_use]
pub fn series_color(index: usize) -> Color {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

/// Cut long legend titles from the left, keeping the distinctive tail
#[must_use]
pub fn truncate_legend(title: &str, width: usize) -> String {
    let len = title.chars().count();
    if len <= width {
        return title.to_string();
    }
    let keep = width.saturating_sub(chart::ELLIPSIS.len());
    let tail: String = title.chars().skip(len - keep).collect();
    format!("{}{}", chart::ELLIPSIS, tail)
}

/// Round an axis bound up to the next half-magnitude step
///
/// 7 → 10, 105 → 150, 1_250_000 → 1_500_000. Values up to 1 give 1.
#[must_use]
pub fn round_up_axis(value: f64) -> f64 {
    if value <= 1.0 {
        return 1.0;
    }
    let magnitude = 10f64.powi(value.log10().floor() as i32);
    let step = if magnitude >= 10.0 { magnitude / 2.0 } else { magnitude * 10.0 };
    (value / step).ceil() * step
}

/// Short human-readable axis label
#[must_use]
pub fn format_axis_label(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.1}G", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

/// Format bytes as B/KB/MB/GB
#[must_use]
pub fn format_bytes(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let value = bytes as f64;
    if value >= GB {
        format!("{:.2} GB", value / GB)
    } else if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Format seconds as `1d 02:03:04`
#[must_use]
pub fn format_uptime(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    }
}
