//! TUI application state and logic

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::constants::{DEFAULT_CHARTED_STAT, server};
use super::helpers::{ChartData, build_chart_data, format_bytes, format_uptime};
use super::log_capture::LogBuffer;
use super::types::{InputMode, KeyAction, ViewMode};
use crate::query::{ClusterSummary, QueryFacade, StatFilter, StatsTable};
use crate::series::Series;
use crate::store::StatValue;
use crate::types::{ClusterKey, FlatKey};

/// Server view contents
#[derive(Debug, Clone, Default)]
pub struct ServerPanel {
    pub gauges: Vec<(&'static str, String)>,
    pub memory: ChartData,
    pub connections: ChartData,
}

/// Clusters view contents
#[derive(Debug, Clone, Default)]
pub struct ClustersPanel {
    pub rows: Vec<ClusterSummary>,
    /// Per-host delta chart for the selected cluster
    pub hosts: ChartData,
}

/// Stats view contents
#[derive(Debug, Clone, Default)]
pub struct StatsPanel {
    /// Filtered rows, without the header
    pub rows: Vec<[String; 2]>,
    pub chart: ChartData,
}

/// TUI application state
pub struct TuiApp {
    stats: QueryFacade<FlatKey>,
    clusters: QueryFacade<ClusterKey>,
    log_buffer: Option<LogBuffer>,
    view: ViewMode,
    input: InputMode,
    log_fullscreen: bool,
    search: String,
    selected_stat: usize,
    /// Set once the user moves the stats selection, disabling auto-selection
    stat_selection_touched: bool,
    selected_cluster: usize,
    charted_stat: String,
    picker_options: Vec<String>,
    picker_index: usize,
    server: ServerPanel,
    clusters_panel: ClustersPanel,
    stats_panel: StatsPanel,
}

/// Builder for [`TuiApp`]
pub struct TuiAppBuilder {
    stats: QueryFacade<FlatKey>,
    clusters: QueryFacade<ClusterKey>,
    log_buffer: Option<LogBuffer>,
    view: ViewMode,
}

impl TuiAppBuilder {
    #[must_use]
    pub fn new(stats: QueryFacade<FlatKey>, clusters: QueryFacade<ClusterKey>) -> Self {
        Self {
            stats,
            clusters,
            log_buffer: None,
            view: ViewMode::default(),
        }
    }

    /// Show captured log lines in the log panel
    #[must_use]
    pub fn with_log_buffer(mut self, log_buffer: LogBuffer) -> Self {
        self.log_buffer = Some(log_buffer);
        self
    }

    #[must_use]
    pub fn with_view(mut self, view: ViewMode) -> Self {
        self.view = view;
        self
    }

    #[must_use]
    pub fn build(self) -> TuiApp {
        let mut app = TuiApp {
            stats: self.stats,
            clusters: self.clusters,
            log_buffer: self.log_buffer,
            view: self.view,
            input: InputMode::Normal,
            log_fullscreen: false,
            search: String::new(),
            selected_stat: 0,
            stat_selection_touched: false,
            selected_cluster: 0,
            charted_stat: DEFAULT_CHARTED_STAT.to_string(),
            picker_options: Vec::new(),
            picker_index: 0,
            server: ServerPanel::default(),
            clusters_panel: ClustersPanel::default(),
            stats_panel: StatsPanel::default(),
        };
        app.update();
        app
    }
}

impl TuiApp {
    /// Re-query the stores for the active view
    ///
    /// Does nothing until the flat poller has completed a cycle, so an empty
    /// store doesn't log a warning per gauge.
    pub fn update(&mut self) {
        match self.view {
            ViewMode::Server => {
                if self.stats.cursor().is_some() {
                    self.server = self.build_server_panel();
                }
            }
            ViewMode::Clusters => {
                if self.clusters.cursor().is_some() {
                    self.clusters_panel = self.build_clusters_panel();
                }
            }
            ViewMode::Stats => {
                if self.stats.cursor().is_some() {
                    self.stats_panel = self.build_stats_panel();
                }
            }
        }
    }

    fn build_server_panel(&self) -> ServerPanel {
        let gauges = server::GAUGES
            .iter()
            .map(|(label, stat)| {
                let value = match self.stats.value_of(stat) {
                    Ok(StatValue::Numeric(v)) if *stat == server::UPTIME => format_uptime(v),
                    Ok(StatValue::Numeric(v)) if stat.contains("memory") => format_bytes(v),
                    Ok(value) => value.to_string(),
                    Err(e) => e.placeholder(),
                };
                (*label, value)
            })
            .collect();

        ServerPanel {
            gauges,
            memory: self.gauge_chart(server::MEMORY_SERIES),
            connections: self.gauge_chart(server::CONNECTION_SERIES),
        }
    }

    fn gauge_chart(&self, names: &[&str]) -> ChartData {
        let series: Vec<(&str, Series)> = names
            .iter()
            .filter_map(|name| {
                let short = name.rsplit('.').next().unwrap_or(*name);
                self.stats
                    .gauge_series(&FlatKey::new(*name))
                    .ok()
                    .flatten()
                    .map(|s| (short, s))
            })
            .collect();
        build_chart_data(series.iter().map(|(name, s)| (*name, s)))
    }

    fn build_clusters_panel(&mut self) -> ClustersPanel {
        let names = self.clusters.cluster_names();
        self.selected_cluster = self.selected_cluster.min(names.len().saturating_sub(1));
        let rows: Vec<ClusterSummary> = names
            .iter()
            .map(|name| ClusterSummary::collect(name, &self.stats))
            .collect();

        let hosts = names
            .get(self.selected_cluster)
            .map(|cluster| {
                let series = self.clusters.host_delta_series(cluster, &self.charted_stat);
                build_chart_data(series.iter().map(|(host, s)| (host.as_str(), s)))
            })
            .unwrap_or_default();

        ClustersPanel { rows, hosts }
    }

    fn build_stats_panel(&mut self) -> StatsPanel {
        let table: StatsTable = self.stats.stats_table(&StatFilter::from_search(&self.search));
        let rows = table.body().to_vec();

        if !self.stat_selection_touched
            && let Some(idx) = rows.iter().position(|row| row[0].ends_with(DEFAULT_CHARTED_STAT))
        {
            self.selected_stat = idx;
        }
        self.selected_stat = self.selected_stat.min(rows.len().saturating_sub(1));

        let chart = rows
            .get(self.selected_stat)
            .and_then(|row| {
                self.stats
                    .delta_series(&FlatKey::new(row[0].as_str()))
                    .ok()
                    .flatten()
                    .map(|s| build_chart_data([(row[0].as_str(), &s)]))
            })
            .unwrap_or_default();

        StatsPanel { rows, chart }
    }

    /// Apply one key press
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return KeyAction::Quit;
        }

        let action = match self.input {
            InputMode::Search => self.handle_search_key(key.code),
            InputMode::Picker => self.handle_picker_key(key.code),
            InputMode::Normal => self.handle_normal_key(key.code),
        };
        if action == KeyAction::Redraw {
            self.update();
        }
        action
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> KeyAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Tab | KeyCode::Right => {
                self.view = self.view.next();
                KeyAction::Redraw
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.view = self.view.previous();
                KeyAction::Redraw
            }
            KeyCode::Char('l') => {
                self.toggle_log_fullscreen();
                KeyAction::Redraw
            }
            KeyCode::Char('/') => match self.view {
                ViewMode::Stats => {
                    self.input = InputMode::Search;
                    KeyAction::Redraw
                }
                ViewMode::Clusters => self.open_picker(),
                ViewMode::Server => KeyAction::Ignored,
            },
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            _ => KeyAction::Ignored,
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) -> KeyAction {
        match code {
            KeyCode::Char(c) => {
                self.search.push(c);
                self.selected_stat = 0;
                KeyAction::Redraw
            }
            KeyCode::Backspace => {
                self.search.pop();
                KeyAction::Redraw
            }
            KeyCode::Esc => {
                self.search.clear();
                self.input = InputMode::Normal;
                KeyAction::Redraw
            }
            KeyCode::Enter => {
                self.input = InputMode::Normal;
                KeyAction::Redraw
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            _ => KeyAction::Ignored,
        }
    }

    fn handle_picker_key(&mut self, code: KeyCode) -> KeyAction {
        match code {
            KeyCode::Up => {
                self.picker_index = self.picker_index.saturating_sub(1);
                KeyAction::Redraw
            }
            KeyCode::Down => {
                if self.picker_index + 1 < self.picker_options.len() {
                    self.picker_index += 1;
                }
                KeyAction::Redraw
            }
            KeyCode::Enter => {
                if let Some(stat) = self.picker_options.get(self.picker_index) {
                    self.charted_stat = stat.clone();
                }
                self.input = InputMode::Normal;
                KeyAction::Redraw
            }
            KeyCode::Esc => {
                self.input = InputMode::Normal;
                KeyAction::Redraw
            }
            _ => KeyAction::Ignored,
        }
    }

    fn open_picker(&mut self) -> KeyAction {
        let names = self.clusters.cluster_names();
        let Some(cluster) = names.get(self.selected_cluster) else {
            return KeyAction::Ignored;
        };
        self.picker_options = self.clusters.host_stat_names(cluster);
        self.picker_index = self
            .picker_options
            .iter()
            .position(|s| *s == self.charted_stat)
            .unwrap_or(0);
        self.input = InputMode::Picker;
        KeyAction::Redraw
    }

    fn move_selection(&mut self, delta: isize) -> KeyAction {
        let (selected, len) = match self.view {
            ViewMode::Stats => {
                self.stat_selection_touched = true;
                (&mut self.selected_stat, self.stats_panel.rows.len())
            }
            ViewMode::Clusters => (&mut self.selected_cluster, self.clusters_panel.rows.len()),
            ViewMode::Server => return KeyAction::Ignored,
        };
        if len == 0 {
            return KeyAction::Ignored;
        }
        *selected = selected.saturating_add_signed(delta).min(len - 1);
        KeyAction::Redraw
    }

    /// Toggle log fullscreen mode
    pub fn toggle_log_fullscreen(&mut self) {
        self.log_fullscreen = !self.log_fullscreen;
    }

    #[must_use]
    pub fn view(&self) -> ViewMode {
        self.view
    }

    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        self.input
    }

    #[must_use]
    pub fn is_log_fullscreen(&self) -> bool {
        self.log_fullscreen
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub fn charted_stat(&self) -> &str {
        &self.charted_stat
    }

    #[must_use]
    pub fn selected_stat(&self) -> usize {
        self.selected_stat
    }

    #[must_use]
    pub fn selected_cluster(&self) -> usize {
        self.selected_cluster
    }

    /// Options shown by the stat picker
    #[must_use]
    pub fn picker(&self) -> (&[String], usize) {
        (&self.picker_options, self.picker_index)
    }

    #[must_use]
    pub fn server_panel(&self) -> &ServerPanel {
        &self.server
    }

    #[must_use]
    pub fn clusters_panel(&self) -> &ClustersPanel {
        &self.clusters_panel
    }

    #[must_use]
    pub fn stats_panel(&self) -> &StatsPanel {
        &self.stats_panel
    }

    /// Slot of the latest flat cycle, for the title bar
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.stats.cursor()
    }

    #[must_use]
    pub fn log_buffer(&self) -> Option<&LogBuffer> {
        self.log_buffer.as_ref()
    }
}
