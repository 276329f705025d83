//! Dashboard TUI main loop.
//!
//! Uses `ratatui` + `crossterm` for rendering. Service requests run in the
//! background of the loop: keys are still handled and the screen redrawn
//! while they are in flight.
#![allow(clippy::future_not_send)]

/// Dashboard state types.
pub mod state;
mod ui;

use std::io;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tgsignal_api::service::LocalSignalService;
use tgsignal_store::{Completion, ExportFormat, PendingRequest, Request, Started, Store};

use self::state::{DashboardState, InputMode, Tab};

/// Requests awaiting a response.
type InFlight = FuturesUnordered<PendingRequest>;

/// What a key press asks the loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    /// Nothing beyond the state change already made.
    None,
    /// Leave the dashboard.
    Quit,
    /// Reload channels and signals.
    Reload,
    /// Flip a channel's status locally.
    ToggleChannel(i64),
    /// Drop a channel from the local list.
    RemoveChannel(i64),
    /// Open a channel's web page.
    OpenChannel(i64),
    /// Delete a signal on the server.
    DeleteSignal(i64),
    /// Submit the add-channel prompt.
    AddChannel(String),
    /// Run a scrape.
    Scrape,
    /// Export the visible signals.
    Export(ExportFormat),
    /// The visible lists need rebuilding.
    Refresh,
}

/// Runs the dashboard TUI until the user quits.
///
/// Starts with a full reload in flight.
///
/// # Errors
///
/// Returns an error if terminal setup or event handling fails.
pub async fn run_dashboard<S: LocalSignalService + 'static>(
    store: &mut Store<S>,
    mut state: DashboardState,
) -> Result<()> {
    let in_flight = InFlight::new();
    apply(Action::Reload, store, &mut state, &in_flight);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let result = run_event_loop(&mut terminal, store, &mut state, in_flight).await;

    // Cleanup (always attempt even if event loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;

    result
}

/// Main event loop.
async fn run_event_loop<S: LocalSignalService + 'static>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: &mut Store<S>,
    state: &mut DashboardState,
    mut in_flight: InFlight,
) -> Result<()> {
    let mut events = EventStream::new();

    loop {
        let busy: Vec<&'static str> = in_flight.iter().map(PendingRequest::label).collect();
        terminal
            .draw(|frame| ui::draw(frame, state, store, &busy))
            .context("failed to draw TUI")?;

        tokio::select! {
            Some(completion) = in_flight.next(), if !in_flight.is_empty() => {
                finish(completion, store, state, &in_flight);
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    let action = match state.input_mode {
                        InputMode::Filter => handle_filter_input(state, key.code),
                        InputMode::AddChannel => handle_add_input(state, key.code),
                        InputMode::Normal => handle_normal_input(state, key.code, key.modifiers),
                    };
                    if action == Action::Quit {
                        return Ok(());
                    }
                    apply(action, store, state, &in_flight);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("failed to read event"),
                None => return Ok(()),
            },
        }
    }
}

/// Handles key input in filter mode.
fn handle_filter_input(state: &mut DashboardState, key: KeyCode) -> Action {
    match key {
        KeyCode::Esc => {
            state.filter_clear();
            state.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            state.input_mode = InputMode::Normal;
            return Action::None;
        }
        KeyCode::Backspace => state.filter_pop(),
        KeyCode::Char(c) => state.filter_push(c),
        _ => return Action::None,
    }
    Action::Refresh
}

/// Handles key input in the add-channel prompt.
fn handle_add_input(state: &mut DashboardState, key: KeyCode) -> Action {
    match key {
        KeyCode::Esc => state.finish_add(),
        KeyCode::Enter => return Action::AddChannel(state.add_input.clone()),
        KeyCode::Backspace => {
            state.add_input.pop();
        }
        KeyCode::Char(c) => state.add_input.push(c),
        _ => {}
    }
    Action::None
}

/// Handles key input in normal mode.
fn handle_normal_input(state: &mut DashboardState, key: KeyCode, modifiers: KeyModifiers) -> Action {
    match key {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Action::Quit,
        KeyCode::Char('r') => return Action::Reload,
        KeyCode::Tab => state.select_tab(state.tab.next()),
        KeyCode::Char(c @ '1'..='5') => {
            if let Some(tab) = Tab::from_digit(c) {
                state.select_tab(tab);
            }
        }
        KeyCode::Up => state.move_up(),
        KeyCode::Down => state.move_down(),
        KeyCode::Char('/') => state.start_filter(),
        _ => return tab_action(state, key),
    }
    Action::None
}

/// Handles the keys that only mean something on one tab.
fn tab_action(state: &mut DashboardState, key: KeyCode) -> Action {
    match (state.tab, key) {
        (Tab::Channels, KeyCode::Char('a')) => {
            state.start_add();
            Action::None
        }
        (Tab::Channels, KeyCode::Char(' ')) => {
            state.selected_channel().map_or(Action::None, Action::ToggleChannel)
        }
        (Tab::Channels, KeyCode::Char('d')) => {
            state.selected_channel().map_or(Action::None, Action::RemoveChannel)
        }
        (Tab::Channels, KeyCode::Char('o')) => {
            state.selected_channel().map_or(Action::None, Action::OpenChannel)
        }
        (Tab::Dashboard, KeyCode::Char('d')) => {
            state.selected_signal().map_or(Action::None, Action::DeleteSignal)
        }
        (Tab::Parsing, KeyCode::Char('s')) => Action::Scrape,
        (Tab::Export, KeyCode::Char('c')) => Action::Export(ExportFormat::Csv),
        (Tab::Export, KeyCode::Char('j')) => Action::Export(ExportFormat::Json),
        _ => Action::None,
    }
}

/// Runs an action against the store and refreshes the visible lists.
///
/// Service requests are started here and pushed onto `in_flight`; their
/// results arrive in [`finish`].
fn apply<S: LocalSignalService + 'static>(
    action: Action,
    store: &mut Store<S>,
    state: &mut DashboardState,
    in_flight: &InFlight,
) {
    let request = match action {
        Action::None | Action::Quit => return,
        Action::Refresh => None,
        Action::Reload => Some(Request::Reload),
        Action::ToggleChannel(id) => {
            store.toggle_channel(id);
            None
        }
        Action::RemoveChannel(id) => {
            store.remove_channel(id);
            None
        }
        Action::OpenChannel(id) => {
            if let Some(channel) = store.channels().get(id) {
                let url = channel.web_url();
                if let Err(e) = open::that(&url) {
                    tracing::warn!(%url, error = %e, "Failed to open browser");
                }
            }
            None
        }
        Action::DeleteSignal(id) => Some(Request::DeleteSignal(id)),
        Action::AddChannel(input) => Some(Request::AddChannel(input)),
        Action::Scrape => Some(Request::Scrape),
        Action::Export(format) => {
            let dir = state.export_dir.clone();
            let query = state.signal_filter.clone();
            if let Err(e) = store.export_signals(format, &dir, &query) {
                tracing::warn!("{e:#}");
            }
            None
        }
    };

    if let Some(request) = request {
        match store.begin(request) {
            Started::Pending(pending) => in_flight.push(pending),
            Started::Rejected => store
                .notifier_mut()
                .error("Enter a channel handle, e.g. @channel"),
            Started::Busy => store
                .notifier_mut()
                .info("A channel is already being added"),
        }
    }
    state.refresh(store.channels(), store.signals());
}

/// Commits a finished request and starts its follow-up reload.
fn finish<S: LocalSignalService + 'static>(
    completion: Completion,
    store: &mut Store<S>,
    state: &mut DashboardState,
    in_flight: &InFlight,
) {
    if matches!(&completion, Completion::ChannelCreated { result: Ok(_), .. }) {
        state.finish_add();
    }
    if let Some(follow_up) = store.complete(completion) {
        in_flight.push(follow_up);
    }
    state.refresh(store.channels(), store.signals());
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::path::PathBuf;

    use anyhow::bail;
    use tgsignal_api::service::{
        Channel, IngestReport, MessageBatch, NewChannel, ScrapeReport, Signal, SignalQuery,
    };
    use tgsignal_store::{ChannelStore, SignalStore};

    use super::*;

    /// Lists are empty and a create never answers.
    #[derive(Debug)]
    struct SlowCreateService;

    impl LocalSignalService for SlowCreateService {
        async fn list_channels(&self) -> anyhow::Result<Vec<Channel>> {
            Ok(Vec::new())
        }

        async fn create_channel(&self, _channel: &NewChannel) -> anyhow::Result<Option<Channel>> {
            futures::future::pending().await
        }

        async fn list_signals(&self, _query: &SignalQuery) -> anyhow::Result<Vec<Signal>> {
            Ok(Vec::new())
        }

        async fn delete_signal(&self, _id: i64) -> anyhow::Result<()> {
            Ok(())
        }

        async fn ingest_messages(&self, _batch: &MessageBatch) -> anyhow::Result<IngestReport> {
            bail!("ingest is not used here")
        }

        async fn trigger_scrape(&self) -> anyhow::Result<ScrapeReport> {
            bail!("scrape is not used here")
        }
    }

    fn make_state() -> DashboardState {
        let mut channels = ChannelStore::new();
        channels.replace(vec![Channel {
            id: 7,
            channel_username: String::from("alpha"),
            channel_title: String::from("Alpha"),
            is_active: true,
            last_message_id: 0,
        }]);
        let mut state = DashboardState::new(5, PathBuf::from("."));
        state.refresh(&channels, &SignalStore::new());
        state
    }

    #[test]
    fn test_quit_keys() {
        // Arrange
        let mut state = make_state();

        // Act & Assert
        assert_eq!(
            handle_normal_input(&mut state, KeyCode::Char('q'), KeyModifiers::NONE),
            Action::Quit
        );
        assert_eq!(
            handle_normal_input(&mut state, KeyCode::Char('c'), KeyModifiers::CONTROL),
            Action::Quit
        );
    }

    #[test]
    fn test_tab_switching() {
        // Arrange
        let mut state = make_state();

        // Act & Assert
        handle_normal_input(&mut state, KeyCode::Char('3'), KeyModifiers::NONE);
        assert_eq!(state.tab, Tab::Parsing);
        handle_normal_input(&mut state, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(state.tab, Tab::Analytics);
    }

    #[test]
    fn test_channel_keys_map_to_selected_id() {
        // Arrange
        let mut state = make_state();
        state.select_tab(Tab::Channels);

        // Act & Assert
        assert_eq!(
            handle_normal_input(&mut state, KeyCode::Char(' '), KeyModifiers::NONE),
            Action::ToggleChannel(7)
        );
        assert_eq!(
            handle_normal_input(&mut state, KeyCode::Char('d'), KeyModifiers::NONE),
            Action::RemoveChannel(7)
        );
        assert_eq!(
            handle_normal_input(&mut state, KeyCode::Char('o'), KeyModifiers::NONE),
            Action::OpenChannel(7)
        );
    }

    #[test]
    fn test_delete_without_selection_is_noop() {
        // Arrange
        let mut state = make_state();

        // Act
        let action = handle_normal_input(&mut state, KeyCode::Char('d'), KeyModifiers::NONE);

        // Assert
        assert_eq!(action, Action::None);
    }

    #[test]
    fn test_scrape_only_on_parsing_tab() {
        // Arrange
        let mut state = make_state();

        // Act & Assert
        assert_eq!(
            handle_normal_input(&mut state, KeyCode::Char('s'), KeyModifiers::NONE),
            Action::None
        );
        state.select_tab(Tab::Parsing);
        assert_eq!(
            handle_normal_input(&mut state, KeyCode::Char('s'), KeyModifiers::NONE),
            Action::Scrape
        );
    }

    #[test]
    fn test_add_prompt_submits_input() {
        // Arrange
        let mut state = make_state();
        state.select_tab(Tab::Channels);
        handle_normal_input(&mut state, KeyCode::Char('a'), KeyModifiers::NONE);

        // Act
        for c in "@beta".chars() {
            handle_add_input(&mut state, KeyCode::Char(c));
        }
        let action = handle_add_input(&mut state, KeyCode::Enter);

        // Assert
        assert_eq!(state.input_mode, InputMode::AddChannel);
        assert_eq!(action, Action::AddChannel(String::from("@beta")));
    }

    #[test]
    fn test_add_prompt_escape_clears() {
        // Arrange
        let mut state = make_state();
        state.start_add();
        handle_add_input(&mut state, KeyCode::Char('x'));

        // Act
        handle_add_input(&mut state, KeyCode::Esc);

        // Assert
        assert_eq!(state.input_mode, InputMode::Normal);
        assert!(state.add_input.is_empty());
    }

    #[test]
    fn test_filter_input() {
        // Arrange
        let mut state = make_state();
        state.select_tab(Tab::Channels);
        handle_normal_input(&mut state, KeyCode::Char('/'), KeyModifiers::NONE);

        // Act
        let typed = handle_filter_input(&mut state, KeyCode::Char('a'));
        let applied = handle_filter_input(&mut state, KeyCode::Enter);

        // Assert
        assert_eq!(typed, Action::Refresh);
        assert_eq!(applied, Action::None);
        assert_eq!(state.channel_filter, "a");
        assert_eq!(state.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_export_keys() {
        // Arrange
        let mut state = make_state();
        state.select_tab(Tab::Export);

        // Act & Assert
        assert_eq!(
            handle_normal_input(&mut state, KeyCode::Char('c'), KeyModifiers::NONE),
            Action::Export(ExportFormat::Csv)
        );
        assert_eq!(
            handle_normal_input(&mut state, KeyCode::Char('j'), KeyModifiers::NONE),
            Action::Export(ExportFormat::Json)
        );
    }

    #[test]
    fn test_second_submit_is_busy_while_add_in_flight() {
        // Arrange
        let mut store = Store::new(SlowCreateService);
        let mut state = make_state();
        let in_flight = InFlight::new();
        state.start_add();

        // Act
        apply(Action::AddChannel(String::from("@beta")), &mut store, &mut state, &in_flight);
        apply(Action::AddChannel(String::from("@beta")), &mut store, &mut state, &in_flight);

        // Assert
        assert_eq!(in_flight.len(), 1);
        assert_eq!(
            in_flight.iter().map(PendingRequest::label).collect::<Vec<_>>(),
            vec!["Adding channel"]
        );
        assert!(store.channels().is_loading());
        assert_eq!(state.input_mode, InputMode::AddChannel);
        assert_eq!(
            store.notifier().latest().unwrap().message,
            "A channel is already being added"
        );
    }

    #[test]
    fn test_blank_submit_sends_nothing() {
        // Arrange
        let mut store = Store::new(SlowCreateService);
        let mut state = make_state();
        let in_flight = InFlight::new();

        // Act
        apply(Action::AddChannel(String::from("  ")), &mut store, &mut state, &in_flight);

        // Assert
        assert!(in_flight.is_empty());
        assert!(!store.channels().is_loading());
    }

    #[test]
    fn test_created_channel_closes_prompt_and_reloads() {
        // Arrange
        let mut store = Store::new(SlowCreateService);
        let mut state = make_state();
        let in_flight = InFlight::new();
        state.start_add();
        state.add_input.push_str("@beta");

        // Act
        finish(
            Completion::ChannelCreated {
                handle: String::from("beta"),
                result: Ok(None),
            },
            &mut store,
            &mut state,
            &in_flight,
        );

        // Assert
        assert_eq!(state.input_mode, InputMode::Normal);
        assert!(state.add_input.is_empty());
        assert_eq!(
            in_flight.iter().map(PendingRequest::label).collect::<Vec<_>>(),
            vec!["Loading channels"]
        );
    }
}
