//! TUI constants and configuration

use ratatui::style::Color;

// ============================================================================
// Layout Constants
// ============================================================================

/// Layout constraints for main UI sections
pub mod layout {
    use ratatui::layout::Constraint;

    pub const TITLE_HEIGHT: u16 = 3;
    pub const FOOTER_HEIGHT: u16 = 3;
    pub const MIN_BODY_HEIGHT: u16 = 10;
    pub const LOG_WINDOW_HEIGHT: u16 = 8;
    /// Log panel is only shown below the body at this terminal height or more
    pub const MIN_HEIGHT_FOR_LOGS: u16 = 36;

    pub const GAUGE_PANEL_HEIGHT: u16 = 6;
    pub const SEARCH_HEIGHT: u16 = 3;
    pub const TABLE_WIDTH_PCT: u16 = 50;

    pub fn main_sections(show_logs: bool) -> Vec<Constraint> {
        let mut sections = vec![
            Constraint::Length(TITLE_HEIGHT),
            Constraint::Min(MIN_BODY_HEIGHT),
        ];
        if show_logs {
            sections.push(Constraint::Length(LOG_WINDOW_HEIGHT));
        }
        sections.push(Constraint::Length(FOOTER_HEIGHT));
        sections
    }

    pub fn table_and_chart() -> [Constraint; 2] {
        [
            Constraint::Percentage(TABLE_WIDTH_PCT),
            Constraint::Percentage(100 - TABLE_WIDTH_PCT),
        ]
    }
}

// ============================================================================
// Chart Configuration
// ============================================================================

pub mod chart {
    /// Longest legend entry before it is cut from the left
    pub const LEGEND_WIDTH: usize = 20;
    pub const ELLIPSIS: &str = "...";
    pub const Y_LABEL_ZERO: &str = "0";
    pub const MEMORY_TITLE: &str = "Memory";
    pub const CONNECTIONS_TITLE: &str = "Connections";
}

// ============================================================================
// Stat Names
// ============================================================================

/// Flat stats shown on the server view
pub mod server {
    /// (label, stat) pairs for the gauge panel
    pub const GAUGES: &[(&str, &str)] = &[
        ("Uptime", "server.uptime"),
        ("Version", "server.version"),
        ("Watchdog misses", "server.watchdog_miss"),
        ("Watchdog mega misses", "server.watchdog_mega_miss"),
        ("Memory allocated", "server.memory_allocated"),
        ("Heap size", "server.memory_heap_size"),
        ("Parent connections", "server.parent_connections"),
        ("Total connections", "server.total_connections"),
    ];

    pub const UPTIME: &str = "server.uptime";
    pub const MEMORY_SERIES: &[&str] = &["server.memory_allocated", "server.memory_heap_size"];
    pub const CONNECTION_SERIES: &[&str] =
        &["server.parent_connections", "server.total_connections"];
}

/// Stat charted per host on the clusters view until another is picked
pub const DEFAULT_CHARTED_STAT: &str = "rq_total";

// ============================================================================
// Color Palette
// ============================================================================

/// Colors for chart series, cycled by index
pub const SERIES_COLORS: &[Color] = &[
    Color::Green,
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Red,
    Color::Blue,
];

/// UI text styles
pub mod styles {
    use ratatui::style::Color;

    pub const LABEL: Color = Color::Gray;
    pub const VALUE_PRIMARY: Color = Color::Green;
    pub const VALUE_SECONDARY: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;
    pub const BORDER_ACTIVE: Color = Color::Cyan;
    pub const BORDER_NORMAL: Color = Color::White;
    pub const HIGHLIGHT_BG: Color = Color::DarkGray;
}

pub mod text {
    pub const TITLE: &str = "Envoy Dash";
    pub const NO_DATA: &str = "waiting for data";
    pub const TAB_TITLES: [&str; 3] = ["Server", "Clusters", "Stats"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Constraint;

    #[test]
    fn test_main_sections_with_and_without_logs() {
        assert_eq!(layout::main_sections(false).len(), 3);
        let with_logs = layout::main_sections(true);
        assert_eq!(with_logs.len(), 4);
        assert_eq!(with_logs[2], Constraint::Length(layout::LOG_WINDOW_HEIGHT));
    }

    #[test]
    fn test_layout_fits_when_logs_shown() {
        let total = layout::TITLE_HEIGHT
            + layout::MIN_BODY_HEIGHT
            + layout::LOG_WINDOW_HEIGHT
            + layout::FOOTER_HEIGHT
            + 2;
        assert!(total <= layout::MIN_HEIGHT_FOR_LOGS);
    }

    #[test]
    fn test_server_series_are_gauges_on_panel() {
        for stat in server::MEMORY_SERIES.iter().chain(server::CONNECTION_SERIES) {
            assert!(server::GAUGES.iter().any(|(_, s)| s == stat));
        }
    }
}
