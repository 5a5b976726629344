//! TUI-specific types

use super::constants::text::TAB_TITLES;

/// Which view fills the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Server,
    Clusters,
    Stats,
}

impl ViewMode {
    pub const ALL: [Self; 3] = [Self::Server, Self::Clusters, Self::Stats];

    /// Position in the tab bar
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Server => 0,
            Self::Clusters => 1,
            Self::Stats => 2,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        TAB_TITLES[self.index()]
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub const fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Where typed characters go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Keys are commands
    #[default]
    Normal,
    /// Typing into the stats search box
    Search,
    /// Choosing the charted stat on the clusters view
    Picker,
}

/// What the event loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Nothing visible changed
    Ignored,
    /// State changed; refresh and redraw
    Redraw,
    Quit,
}
