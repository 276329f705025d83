//! TUI rendering logic for the dashboard.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, Tabs};
use tgsignal_api::service::{LocalSignalService, Signal};
use tgsignal_store::{Level, Store, Summary};

use super::state::{DashboardState, InputMode, Tab};

/// Formats an optional price.
fn fmt_price(price: Option<f64>) -> String {
    price.map_or_else(|| String::from("-"), |p| format!("{p:.2}"))
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn highlight_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// Draws the dashboard UI. `busy` holds the labels of in-flight requests.
#[allow(clippy::indexing_slicing)]
pub fn draw<S: LocalSignalService>(
    frame: &mut Frame,
    state: &mut DashboardState,
    store: &Store<S>,
    busy: &[&'static str],
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // tabs
            Constraint::Min(5),    // main content
            Constraint::Length(4), // footer
        ])
        .split(frame.area());

    let title = if busy.is_empty() {
        String::from(" tgsignal ")
    } else {
        format!(" tgsignal | {}... ", busy.join(", "))
    };
    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .select(state.tab.index())
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(highlight_style());
    frame.render_widget(tabs, chunks[0]);

    match state.tab {
        Tab::Dashboard => draw_dashboard(frame, chunks[1], state, store),
        Tab::Channels => draw_channels(frame, chunks[1], state, store),
        Tab::Parsing => draw_parsing(frame, chunks[1], store),
        Tab::Analytics => draw_analytics(frame, chunks[1], &store.summary()),
        Tab::Export => draw_export(frame, chunks[1], state, store),
    }

    draw_footer(frame, chunks[2], state, store);
}

/// Draws the summary figures and the recent signal table.
#[allow(clippy::indexing_slicing)]
fn draw_dashboard<S: LocalSignalService>(
    frame: &mut Frame,
    area: Rect,
    state: &mut DashboardState,
    store: &Store<S>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    let summary = store.summary();
    let mean = summary
        .returns
        .mean
        .map_or_else(|| String::from("-"), |m| format!("{m:.1}%"));
    let stats = Paragraph::new(vec![
        Line::from(format!(
            "{} channels ({} active)  {} signals",
            summary.total_channels, summary.active_channels, summary.total_signals
        )),
        Line::from(format!(
            "BUY {}  SELL {}  other {}  unknown {}  avg potential {mean}",
            summary.by_type.buy, summary.by_type.sell, summary.by_type.other, summary.by_type.unknown
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Summary "));
    frame.render_widget(stats, chunks[0]);

    let title = if state.signal_filter.is_empty() {
        String::from(" Recent signals ")
    } else {
        format!(" Signals matching \"{}\" ", state.signal_filter)
    };
    let signals = store.signals().all();
    let rows: Vec<Row> = state
        .visible_signals()
        .iter()
        .filter_map(|id| signals.iter().find(|s| s.id == *id))
        .map(signal_row)
        .collect();
    let widths = [
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Min(19),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec![
                "ID", "Ticker", "Type", "Entry", "Target", "Stop", "Channel", "Created",
            ])
            .style(header_style())
            .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(highlight_style());

    frame.render_stateful_widget(table, chunks[1], &mut state.signal_table_state);
}

fn signal_row(s: &Signal) -> Row<'static> {
    let style = match s.potential_return_pct() {
        Some(pct) if pct < 0.0 => Style::default().fg(Color::Red),
        Some(_) => Style::default().fg(Color::Green),
        None => Style::default(),
    };
    Row::new(vec![
        s.id.to_string(),
        s.ticker.clone().unwrap_or_else(|| String::from("-")),
        String::from(s.signal_type.label()),
        fmt_price(s.entry_price),
        fmt_price(s.target_price),
        fmt_price(s.stop_loss),
        format!("@{}", s.channel_username),
        s.created_at.clone(),
    ])
    .style(style)
}

/// Draws the channel table with filter and add prompt.
#[allow(clippy::indexing_slicing)]
fn draw_channels<S: LocalSignalService>(
    frame: &mut Frame,
    area: Rect,
    state: &mut DashboardState,
    store: &Store<S>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let prompt = if state.input_mode == InputMode::AddChannel {
        let title = if store.channels().is_loading() {
            " Adding... "
        } else {
            " Add channel: Enter submit, Esc cancel "
        };
        Paragraph::new(state.add_input.clone())
            .style(Style::default().fg(Color::Green))
            .block(Block::default().borders(Borders::ALL).title(title))
    } else {
        let style = if state.input_mode == InputMode::Filter {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Paragraph::new(state.channel_filter.clone())
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(" Filter: / "))
    };
    frame.render_widget(prompt, chunks[0]);

    let channels = store.channels();
    let rows: Vec<Row> = state
        .visible_channels()
        .iter()
        .filter_map(|&id| {
            let c = channels.get(id)?;
            let (status, style) = if c.is_active {
                ("Active", Style::default().fg(Color::Green))
            } else {
                ("Stopped", Style::default().fg(Color::DarkGray))
            };
            let mark = if channels.is_unsynced(id) { "*" } else { "" };
            Some(
                Row::new(vec![
                    c.id.to_string(),
                    c.handle(),
                    c.channel_title.clone(),
                    format!("{status}{mark}"),
                ])
                .style(style),
            )
        })
        .collect();

    let title = if channels.has_unsynced_changes() {
        format!(
            " Channels ({} local edit(s), r discards) ",
            channels.unsynced_count()
        )
    } else {
        String::from(" Channels ")
    };
    let widths = [
        Constraint::Length(6),
        Constraint::Length(24),
        Constraint::Min(20),
        Constraint::Length(9),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["ID", "Handle", "Title", "Status"])
                .style(header_style())
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(highlight_style());

    frame.render_stateful_widget(table, chunks[1], &mut state.channel_table_state);
}

/// Draws active channels with their scrape cursors and the last report.
#[allow(clippy::indexing_slicing)]
fn draw_parsing<S: LocalSignalService>(frame: &mut Frame, area: Rect, store: &Store<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let rows: Vec<Row> = store
        .channels()
        .active()
        .map(|c| Row::new(vec![c.handle(), c.last_message_id.to_string()]))
        .collect();
    let table = Table::new(rows, [Constraint::Min(24), Constraint::Length(16)])
        .header(
            Row::new(vec!["Channel", "Last message"])
                .style(header_style())
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(" Active channels "));
    frame.render_widget(table, chunks[0]);

    let report = store.last_scrape().map_or_else(
        || String::from("No scrape run yet"),
        |r| format!("{}: {} new signal(s)", r.status, r.parsed_messages),
    );
    let last = Paragraph::new(report)
        .block(Block::default().borders(Borders::ALL).title(" Last scrape "));
    frame.render_widget(last, chunks[1]);
}

/// Builds a two-column count table.
fn count_table<'a>(title: &'a str, label: &'a str, counts: &[(String, usize)]) -> Table<'a> {
    let rows: Vec<Row> = counts
        .iter()
        .map(|(name, n)| Row::new(vec![name.clone(), n.to_string()]))
        .collect();
    Table::new(rows, [Constraint::Min(12), Constraint::Length(8)])
        .header(
            Row::new(vec![label, "Count"])
                .style(header_style())
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
}

/// Draws the per-channel, ticker and return tables.
#[allow(clippy::indexing_slicing)]
fn draw_analytics(frame: &mut Frame, area: Rect, summary: &Summary) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    let per_channel: Vec<(String, usize)> = summary
        .per_channel
        .iter()
        .map(|(name, n)| (format!("@{name}"), *n))
        .collect();
    frame.render_widget(
        count_table(" Signals per channel ", "Channel", &per_channel),
        chunks[0],
    );
    frame.render_widget(
        count_table(" Top tickers ", "Ticker", &summary.top_tickers),
        chunks[1],
    );

    let histogram: Vec<(String, usize)> = summary
        .returns
        .histogram()
        .map(|(bucket, n)| (String::from(bucket.label()), n))
        .collect();
    let title = summary.returns.mean.map_or_else(
        || String::from(" Potential return "),
        |m| format!(" Potential return (avg {m:.1}%) "),
    );
    frame.render_widget(count_table(&title, "Range", &histogram), chunks[2]);
}

/// Draws the export target and session history.
#[allow(clippy::indexing_slicing)]
fn draw_export<S: LocalSignalService>(
    frame: &mut Frame,
    area: Rect,
    state: &DashboardState,
    store: &Store<S>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    let filter = if state.signal_filter.is_empty() {
        String::from("all signals")
    } else {
        format!("signals matching \"{}\"", state.signal_filter)
    };
    let target = Paragraph::new(vec![
        Line::from(format!("Directory: {}", state.export_dir.display())),
        Line::from(format!("Selection: {filter}")),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Export "));
    frame.render_widget(target, chunks[0]);

    let rows: Vec<Row> = store
        .exports()
        .iter()
        .rev()
        .map(|r| {
            Row::new(vec![
                r.at.format("%H:%M:%S").to_string(),
                String::from(r.format.label()),
                r.records.to_string(),
                r.path.display().to_string(),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(9),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Min(20),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Time", "Format", "Records", "Path"])
                .style(header_style())
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(" History "));
    frame.render_widget(table, chunks[1]);
}

/// Draws the footer with key hints and the latest notification.
fn draw_footer<S: LocalSignalService>(
    frame: &mut Frame,
    area: Rect,
    state: &DashboardState,
    store: &Store<S>,
) {
    let help_text = match (state.input_mode, state.tab) {
        (InputMode::Filter, _) => "Type to filter | Esc: cancel | Enter: apply",
        (InputMode::AddChannel, _) => "Type a handle | Esc: cancel | Enter: add",
        (InputMode::Normal, Tab::Dashboard) => {
            "1-5/Tab: tab  \u{2191}\u{2193}: move  /: filter  d: delete signal  r: reload  q: quit"
        }
        (InputMode::Normal, Tab::Channels) => {
            "\u{2191}\u{2193}: move  /: filter  a: add  space: toggle  d: remove  o: open  r: reload  q: quit"
        }
        (InputMode::Normal, Tab::Parsing) => "1-5/Tab: tab  s: scrape  r: reload  q: quit",
        (InputMode::Normal, Tab::Analytics) => "1-5/Tab: tab  r: reload  q: quit",
        (InputMode::Normal, Tab::Export) => "1-5/Tab: tab  c: CSV  j: JSON  r: reload  q: quit",
    };

    let status = store.notifier().latest().map_or_else(Line::default, |n| {
        let color = match n.level {
            Level::Info => Color::White,
            Level::Success => Color::Green,
            Level::Error => Color::Red,
        };
        Line::from(Span::styled(n.message.clone(), Style::default().fg(color)))
    });

    let footer = Paragraph::new(vec![Line::from(help_text), status])
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
