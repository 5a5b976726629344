//! TUI rendering and layout

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, List, ListItem, ListState,
        Paragraph, Row, Table, TableState, Tabs,
    },
};

use super::app::TuiApp;
use super::constants::{chart, layout, styles, text};
use super::helpers::{ChartData, format_axis_label};
use super::types::{InputMode, ViewMode};
use crate::query::{ClusterSummary, STATS_TABLE_HEADER};

/// Render the whole screen
pub fn render_ui(f: &mut Frame, app: &TuiApp) {
    if app.is_log_fullscreen() {
        render_logs(f, f.area(), app, true);
        return;
    }

    let show_logs = app.log_buffer().is_some() && f.area().height >= layout::MIN_HEIGHT_FOR_LOGS;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(layout::main_sections(show_logs))
        .split(f.area());

    render_title(f, chunks[0], app);

    match app.view() {
        ViewMode::Server => render_server(f, chunks[1], app),
        ViewMode::Clusters => render_clusters(f, chunks[1], app),
        ViewMode::Stats => render_stats(f, chunks[1], app),
    }

    if show_logs {
        render_logs(f, chunks[2], app, false);
    }
    render_footer(f, chunks[chunks.len() - 1], app);

    if app.input_mode() == InputMode::Picker {
        render_picker(f, chunks[1], app);
    }
}

fn label(text: impl Into<String>) -> Span<'static> {
    Span::styled(text.into(), Style::default().fg(styles::LABEL))
}

fn bordered(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title.into())
        .border_style(Style::default().fg(styles::BORDER_NORMAL))
}

/// Title with the view tabs
fn render_title(f: &mut Frame, area: Rect, app: &TuiApp) {
    let status = match app.cursor() {
        Some(slot) => format!(" slot {} ", slot),
        None => format!(" {} ", text::NO_DATA),
    };
    let tabs = Tabs::new(ViewMode::ALL.iter().map(|v| Line::from(v.title())))
        .select(app.view().index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    text::TITLE,
                    Style::default()
                        .fg(styles::BORDER_ACTIVE)
                        .add_modifier(Modifier::BOLD),
                ))
                .title_bottom(Line::from(status).alignment(Alignment::Right))
                .border_style(Style::default().fg(styles::BORDER_ACTIVE)),
        )
        .highlight_style(
            Style::default()
                .fg(styles::VALUE_SECONDARY)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_server(f: &mut Frame, area: Rect, app: &TuiApp) {
    let panel = app.server_panel();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(layout::GAUGE_PANEL_HEIGHT),
            Constraint::Min(0),
        ])
        .split(area);

    // Two gauge columns
    let lines: Vec<Line> = panel
        .gauges
        .chunks(2)
        .map(|pair| {
            Line::from(
                pair.iter()
                    .flat_map(|(name, value)| {
                        [
                            label(format!("{}: ", name)),
                            Span::styled(
                                format!("{:<16}", value),
                                Style::default()
                                    .fg(styles::VALUE_PRIMARY)
                                    .add_modifier(Modifier::BOLD),
                            ),
                        ]
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    f.render_widget(Paragraph::new(lines).block(bordered("Server")), chunks[0]);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(layout::table_and_chart())
        .split(chunks[1]);
    render_chart(f, charts[0], chart::MEMORY_TITLE, &panel.memory);
    render_chart(f, charts[1], chart::CONNECTIONS_TITLE, &panel.connections);
}

fn render_clusters(f: &mut Frame, area: Rect, app: &TuiApp) {
    let panel = app.clusters_panel();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(layout::table_and_chart())
        .split(area);

    let header = Row::new(ClusterSummary::HEADERS.map(Cell::from))
        .style(Style::default().fg(styles::VALUE_SECONDARY).add_modifier(Modifier::BOLD));
    let rows = panel
        .rows
        .iter()
        .map(|row| Row::new(row.cells().map(|c| Cell::from(c.to_string()))));
    let table = Table::new(
        rows,
        [
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(bordered("Clusters"))
    .row_highlight_style(Style::default().bg(styles::HIGHLIGHT_BG));

    let mut state = TableState::default().with_selected(Some(app.selected_cluster()));
    f.render_stateful_widget(table, chunks[0], &mut state);

    let title = format!("{} per host", app.charted_stat());
    render_chart(f, chunks[1], &title, &panel.hosts);
}

fn render_stats(f: &mut Frame, area: Rect, app: &TuiApp) {
    let panel = app.stats_panel();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(layout::SEARCH_HEIGHT), Constraint::Min(0)])
        .split(area);

    let searching = app.input_mode() == InputMode::Search;
    let search_border = if searching {
        styles::BORDER_ACTIVE
    } else {
        styles::BORDER_NORMAL
    };
    let cursor = if searching { "_" } else { "" };
    f.render_widget(
        Paragraph::new(format!("{}{}", app.search(), cursor)).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search")
                .border_style(Style::default().fg(search_border)),
        ),
        chunks[0],
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(layout::table_and_chart())
        .split(chunks[1]);

    let header = Row::new(STATS_TABLE_HEADER.map(Cell::from))
        .style(Style::default().fg(styles::VALUE_SECONDARY).add_modifier(Modifier::BOLD));
    let rows = panel
        .rows
        .iter()
        .map(|[name, value]| Row::new([Cell::from(name.clone()), Cell::from(value.clone())]));
    let table = Table::new(rows, [Constraint::Percentage(75), Constraint::Percentage(25)])
        .header(header)
        .block(bordered(format!("Stats ({})", panel.rows.len())))
        .row_highlight_style(Style::default().bg(styles::HIGHLIGHT_BG));

    let mut state = TableState::default().with_selected(Some(app.selected_stat()));
    f.render_stateful_widget(table, body[0], &mut state);

    render_chart(f, body[1], "Stats", &panel.chart);
}

/// Line chart with a legend; placeholder text when there is nothing to plot
fn render_chart(f: &mut Frame, area: Rect, title: &str, data: &ChartData) {
    if data.is_empty() {
        f.render_widget(
            Paragraph::new(text::NO_DATA)
                .alignment(Alignment::Center)
                .style(Style::default().fg(styles::LABEL))
                .block(bordered(title.to_string())),
            area,
        );
        return;
    }

    let datasets: Vec<Dataset> = data
        .lines
        .iter()
        .map(|line| {
            Dataset::default()
                .name(line.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(line.color))
                .data(&line.points)
        })
        .collect();

    let [y_min, y_max] = data.y_bounds();
    let y_labels: Vec<Span> = if y_min < 0.0 {
        vec![
            Span::raw(format_axis_label(y_min)),
            Span::raw(chart::Y_LABEL_ZERO),
            Span::raw(format_axis_label(y_max)),
        ]
    } else {
        vec![
            Span::raw(chart::Y_LABEL_ZERO),
            Span::raw(format_axis_label(y_max / 2.0)),
            Span::raw(format_axis_label(y_max)),
        ]
    };

    let chart = Chart::new(datasets)
        .block(bordered(title.to_string()))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds(data.x_bounds()),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );
    f.render_widget(chart, area);
}

fn render_logs(f: &mut Frame, area: Rect, app: &TuiApp, fullscreen: bool) {
    let height = area.height.saturating_sub(2) as usize;
    let lines = app
        .log_buffer()
        .map(|buffer| buffer.tail(height))
        .unwrap_or_default();

    let items: Vec<ListItem> = lines
        .into_iter()
        .map(|line| {
            let color = if line.contains("ERROR") {
                styles::ERROR
            } else if line.contains("WARN") {
                styles::VALUE_SECONDARY
            } else {
                styles::LABEL
            };
            ListItem::new(Span::styled(line, Style::default().fg(color)))
        })
        .collect();

    let title = if fullscreen {
        "Logs (press l to return)"
    } else {
        "Logs"
    };
    f.render_widget(List::new(items).block(bordered(title)), area);
}

/// Stat picker overlay for the clusters chart
fn render_picker(f: &mut Frame, area: Rect, app: &TuiApp) {
    let (options, selected) = app.picker();
    let width = area.width.min(40);
    let height = area.height.min(options.len() as u16 + 2).max(3);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let items: Vec<ListItem> = options
        .iter()
        .map(|name| ListItem::new(name.as_str()))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Chart stat")
                .border_style(Style::default().fg(styles::BORDER_ACTIVE)),
        )
        .highlight_style(Style::default().bg(styles::HIGHLIGHT_BG).add_modifier(Modifier::BOLD));

    let mut state = ListState::default().with_selected(Some(selected));
    f.render_widget(Clear, popup);
    f.render_stateful_widget(list, popup, &mut state);
}

fn render_footer(f: &mut Frame, area: Rect, app: &TuiApp) {
    let key = |k: &'static str| {
        Span::styled(
            k,
            Style::default()
                .fg(styles::BORDER_ACTIVE)
                .add_modifier(Modifier::BOLD),
        )
    };

    let spans = match app.input_mode() {
        InputMode::Search => vec![
            label("Type to filter  |  "),
            key("Enter"),
            label(" keep  |  "),
            key("Esc"),
            label(" clear"),
        ],
        InputMode::Picker => vec![
            key("↑↓"),
            label(" choose  |  "),
            key("Enter"),
            label(" chart  |  "),
            key("Esc"),
            label(" cancel"),
        ],
        InputMode::Normal => vec![
            key("Tab"),
            label(" view  |  "),
            key("/"),
            label(" search/pick  |  "),
            key("l"),
            label(" logs  |  "),
            key("q"),
            label(" quit"),
        ],
    };

    f.render_widget(
        Paragraph::new(Line::from(spans))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Gray)),
            )
            .alignment(Alignment::Center),
        area,
    );
}
