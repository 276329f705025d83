//! Dashboard TUI state management.

use std::collections::HashSet;
use std::path::PathBuf;

use ratatui::widgets::TableState;
use tgsignal_store::{ChannelStore, SignalStore, filter_channels, filter_signals};

/// Dashboard tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// Summary figures and recent signals.
    Dashboard,
    /// Channel management.
    Channels,
    /// Scrape controls.
    Parsing,
    /// Analytics tables.
    Analytics,
    /// Export controls and history.
    Export,
}

impl Tab {
    /// All tabs in display order.
    pub const ALL: [Self; 5] = [
        Self::Dashboard,
        Self::Channels,
        Self::Parsing,
        Self::Analytics,
        Self::Export,
    ];

    /// Tab title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Channels => "Channels",
            Self::Parsing => "Parsing",
            Self::Analytics => "Analytics",
            Self::Export => "Export",
        }
    }

    /// Position in [`Tab::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Dashboard => 0,
            Self::Channels => 1,
            Self::Parsing => 2,
            Self::Analytics => 3,
            Self::Export => 4,
        }
    }

    /// Next tab, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Dashboard => Self::Channels,
            Self::Channels => Self::Parsing,
            Self::Parsing => Self::Analytics,
            Self::Analytics => Self::Export,
            Self::Export => Self::Dashboard,
        }
    }

    /// Tab for a `1`-`5` key.
    #[must_use]
    pub fn from_digit(c: char) -> Option<Self> {
        let idx = usize::try_from(c.to_digit(10)?).ok()?.checked_sub(1)?;
        Self::ALL.get(idx).copied()
    }
}

/// Input mode for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode.
    Normal,
    /// Filter text input mode (Dashboard and Channels tabs).
    Filter,
    /// Add-channel prompt (Channels tab).
    AddChannel,
}

/// State for the dashboard TUI.
#[allow(clippy::module_name_repetitions)]
pub struct DashboardState {
    /// Active tab.
    pub tab: Tab,
    /// Current input mode.
    pub input_mode: InputMode,
    /// Channel filter text.
    pub channel_filter: String,
    /// Signal filter text.
    pub signal_filter: String,
    /// Add-channel prompt text.
    pub add_input: String,
    /// Table state for the channel list.
    pub channel_table_state: TableState,
    /// Table state for the dashboard signal list.
    pub signal_table_state: TableState,
    /// Number of signals shown when no filter is set.
    pub recent_limit: usize,
    /// Directory for exports.
    pub export_dir: PathBuf,
    /// Cached visible channel IDs.
    channel_ids: Vec<i64>,
    /// Cached visible signal IDs, newest first.
    signal_ids: Vec<i64>,
}

impl DashboardState {
    /// Creates a new state.
    #[must_use]
    pub fn new(recent_limit: usize, export_dir: PathBuf) -> Self {
        Self {
            tab: Tab::Dashboard,
            input_mode: InputMode::Normal,
            channel_filter: String::new(),
            signal_filter: String::new(),
            add_input: String::new(),
            channel_table_state: TableState::default(),
            signal_table_state: TableState::default(),
            recent_limit,
            export_dir,
            channel_ids: Vec::new(),
            signal_ids: Vec::new(),
        }
    }

    /// Returns visible channel IDs.
    #[must_use]
    pub fn visible_channels(&self) -> &[i64] {
        &self.channel_ids
    }

    /// Returns visible signal IDs.
    #[must_use]
    pub fn visible_signals(&self) -> &[i64] {
        &self.signal_ids
    }

    /// Returns the selected channel ID (if any).
    #[must_use]
    pub fn selected_channel(&self) -> Option<i64> {
        let idx = self.channel_table_state.selected()?;
        self.channel_ids.get(idx).copied()
    }

    /// Returns the selected signal ID (if any).
    #[must_use]
    pub fn selected_signal(&self) -> Option<i64> {
        let idx = self.signal_table_state.selected()?;
        self.signal_ids.get(idx).copied()
    }

    /// Switches tab and leaves any input mode.
    pub const fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.input_mode = InputMode::Normal;
    }

    /// Filter text for the active tab (if the tab has one).
    #[must_use]
    pub fn active_filter(&self) -> Option<&str> {
        match self.tab {
            Tab::Dashboard => Some(&self.signal_filter),
            Tab::Channels => Some(&self.channel_filter),
            _ => None,
        }
    }

    /// Enters filter mode if the active tab has a filter.
    pub fn start_filter(&mut self) {
        if self.active_filter().is_some() {
            self.input_mode = InputMode::Filter;
        }
    }

    /// Opens the add-channel prompt.
    pub fn start_add(&mut self) {
        self.add_input.clear();
        self.input_mode = InputMode::AddChannel;
    }

    /// Closes the add-channel prompt and clears it.
    pub fn finish_add(&mut self) {
        self.add_input.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Appends a character to the active filter.
    pub fn filter_push(&mut self, ch: char) {
        match self.tab {
            Tab::Dashboard => self.signal_filter.push(ch),
            Tab::Channels => self.channel_filter.push(ch),
            _ => {}
        }
    }

    /// Removes the last character from the active filter.
    pub fn filter_pop(&mut self) {
        match self.tab {
            Tab::Dashboard => {
                self.signal_filter.pop();
            }
            Tab::Channels => {
                self.channel_filter.pop();
            }
            _ => {}
        }
    }

    /// Clears the active filter.
    pub fn filter_clear(&mut self) {
        match self.tab {
            Tab::Dashboard => self.signal_filter.clear(),
            Tab::Channels => self.channel_filter.clear(),
            _ => {}
        }
    }

    /// Rebuilds the visible lists from the store snapshots.
    ///
    /// Keeps the cursor on the same row index where possible.
    pub fn refresh(&mut self, channels: &ChannelStore, signals: &SignalStore) {
        self.channel_ids = filter_channels(channels.all(), &self.channel_filter)
            .iter()
            .map(|c| c.id)
            .collect();

        let recent = signals.recent(signals.all().len());
        self.signal_ids = if self.signal_filter.is_empty() {
            recent
                .iter()
                .take(self.recent_limit)
                .map(|s| s.id)
                .collect()
        } else {
            let matched: HashSet<i64> = filter_signals(signals.all(), &self.signal_filter)
                .iter()
                .map(|s| s.id)
                .collect();
            recent
                .iter()
                .map(|s| s.id)
                .filter(|id| matched.contains(id))
                .collect()
        };

        clamp_selection(&mut self.channel_table_state, self.channel_ids.len());
        clamp_selection(&mut self.signal_table_state, self.signal_ids.len());
    }

    /// Moves cursor up in the active list.
    pub fn move_up(&mut self) {
        if let Some(table) = self.active_table() {
            let current = table.selected().unwrap_or(0);
            table.select(Some(current.saturating_sub(1)));
        }
    }

    /// Moves cursor down in the active list.
    pub fn move_down(&mut self) {
        let len = match self.tab {
            Tab::Dashboard => self.signal_ids.len(),
            Tab::Channels => self.channel_ids.len(),
            _ => return,
        };
        if let Some(table) = self.active_table() {
            let current = table.selected().unwrap_or(0);
            let next = current.saturating_add(1);
            if next < len {
                table.select(Some(next));
            }
        }
    }

    fn active_table(&mut self) -> Option<&mut TableState> {
        match self.tab {
            Tab::Dashboard => Some(&mut self.signal_table_state),
            Tab::Channels => Some(&mut self.channel_table_state),
            _ => None,
        }
    }
}

/// Keeps a table selection within `len` rows.
fn clamp_selection(table: &mut TableState, len: usize) {
    if len == 0 {
        table.select(None);
    } else {
        let current = table.selected().unwrap_or(0);
        table.select(Some(current.min(len.saturating_sub(1))));
    }
}
