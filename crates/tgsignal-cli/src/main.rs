//! tgsignal - trade-signal channel monitor CLI and dashboard.

/// Application configuration (TOML).
mod config;
/// Terminal UI components.
mod tui;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, ServiceConfig, resolve_config_path, resolve_data_dir};
use crate::tui::state::DashboardState;
use tgsignal_api::service::{
    LocalSignalService, RawMessage, SignalQuery, SignalServiceClient,
};
use tgsignal_store::export::export_to_path;
use tgsignal_store::{AddChannelOutcome, ExportFormat, Level, Store, filter_channels};

/// Log file used while the dashboard owns the terminal.
const DASHBOARD_LOG_FILE: &str = "tgsignal.log";

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Open the terminal dashboard.
    Dashboard,
    /// Monitored channel operations.
    Channels(ChannelsCommand),
    /// Parsed signal operations.
    Signals(SignalsCommand),
    /// Scrape all active channels for new signals.
    Scrape,
    /// Export signals to a CSV or JSON file.
    Export(ExportArgs),
    /// Show or edit the configuration file.
    Config(ConfigCommand),
}

/// Arguments for the `channels` subcommand.
#[derive(clap::Args)]
struct ChannelsCommand {
    /// Channels subcommand to run.
    #[command(subcommand)]
    command: ChannelsSubcommands,
}

/// Channels subcommands.
#[derive(Subcommand)]
enum ChannelsSubcommands {
    /// List monitored channels.
    List {
        /// Case-insensitive filter on handle or title.
        #[arg(long)]
        query: Option<String>,
    },
    /// Add a channel to monitor.
    Add {
        /// Channel handle, with or without a leading `@`.
        handle: String,
    },
}

/// Arguments for the `signals` subcommand.
#[derive(clap::Args)]
struct SignalsCommand {
    /// Signals subcommand to run.
    #[command(subcommand)]
    command: SignalsSubcommands,
}

/// Signals subcommands.
#[derive(Subcommand)]
enum SignalsSubcommands {
    /// List parsed signals, newest first.
    List(SignalFilterArgs),
    /// Delete a signal.
    Delete {
        /// Signal ID.
        #[arg(long, required = true)]
        id: i64,
    },
    /// Submit raw channel messages for parsing.
    Ingest {
        /// Channel the messages came from.
        #[arg(long, required = true)]
        channel: String,
        /// JSON file with `[{id, text, date}]` messages.
        #[arg(long, required = true)]
        file: PathBuf,
    },
}

/// Server-side signal filters.
#[derive(clap::Args)]
struct SignalFilterArgs {
    /// Maximum number of signals.
    #[arg(long)]
    limit: Option<u32>,

    /// Only signals for this ticker.
    #[arg(long)]
    ticker: Option<String>,

    /// Only signals from this channel.
    #[arg(long)]
    channel: Option<String>,
}

impl SignalFilterArgs {
    fn to_query(&self) -> SignalQuery {
        let mut query = SignalQuery::new();
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(ticker) = &self.ticker {
            query = query.ticker(ticker.as_str());
        }
        if let Some(channel) = &self.channel {
            query = query.channel(channel.trim_start_matches('@'));
        }
        query
    }
}

/// Export file format.
#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Comma-separated values with a header row.
    Csv,
    /// Pretty-printed JSON array.
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => Self::Csv,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Arguments for the `export` subcommand.
#[derive(clap::Args)]
struct ExportArgs {
    /// Output format.
    #[arg(long, value_enum, required = true)]
    format: FormatArg,

    /// Output file path.
    #[arg(long, required = true)]
    output: PathBuf,

    /// Only signals for this ticker.
    #[arg(long)]
    ticker: Option<String>,

    /// Only signals from this channel.
    #[arg(long)]
    channel: Option<String>,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the effective configuration.
    Show,
    /// Write service settings to the config file.
    Set(ConfigSetArgs),
}

/// Arguments for `config set`.
#[derive(clap::Args)]
struct ConfigSetArgs {
    /// Channel list/create endpoint.
    #[arg(long)]
    channels_url: Option<String>,

    /// Signal list/delete/ingest endpoint.
    #[arg(long)]
    signals_url: Option<String>,

    /// Scrape trigger endpoint.
    #[arg(long)]
    scrape_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

/// Builds the service client from the configured endpoints.
///
/// # Errors
///
/// Returns an error if an endpoint is missing or invalid.
#[instrument(skip_all)]
fn build_client(service: &ServiceConfig) -> Result<SignalServiceClient> {
    let mut builder = SignalServiceClient::builder()
        .channels_url(service.channels_endpoint()?)
        .signals_url(service.signals_endpoint()?)
        .timeout(service.timeout())
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
    if let Some(scrape_url) = service.scrape_endpoint()? {
        builder = builder.scrape_url(scrape_url);
    }
    builder.build().context("failed to build service client")
}

/// Loads the config and builds a store around the service client.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or the client fails to build.
fn open_store(dir: Option<&PathBuf>) -> Result<(AppConfig, Store<SignalServiceClient>)> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;
    let client = build_client(&config.service)?;
    Ok((config, Store::new(client)))
}

/// Logs and clears the store's pending notifications.
fn log_notifications<S: LocalSignalService>(store: &mut Store<S>) {
    for n in store.notifier_mut().drain() {
        match n.level {
            Level::Error => tracing::error!("{}", n.message),
            Level::Info | Level::Success => tracing::info!("{}", n.message),
        }
    }
}

/// Runs the `dashboard` subcommand.
///
/// # Errors
///
/// Returns an error if config loading or the TUI fails.
#[instrument(skip_all)]
#[allow(clippy::future_not_send)]
async fn run_dashboard(dir: Option<&PathBuf>) -> Result<()> {
    let (config, mut store) = open_store(dir)?;
    let state = DashboardState::new(config.dashboard.recent_signals, config.export_dir());
    crate::tui::run_dashboard(&mut store, state)
        .await
        .context("dashboard TUI failed")
}

/// Runs the `channels list` subcommand.
///
/// # Errors
///
/// Returns an error if the channel list cannot be loaded.
#[instrument(skip_all)]
async fn run_channels_list(query: Option<&str>, dir: Option<&PathBuf>) -> Result<()> {
    let (_, mut store) = open_store(dir)?;
    let loaded = store.reload_channels().await;
    log_notifications(&mut store);
    loaded?;

    let channels = filter_channels(store.channels().all(), query.unwrap_or_default());
    if channels.is_empty() {
        tracing::info!("No channels found.");
        return Ok(());
    }

    tracing::info!("Channels ({}):", channels.len());
    for c in channels {
        let status = if c.is_active { "active" } else { "stopped" };
        tracing::info!(
            "  {:>5}  {:<24}  {:<8}  {}",
            c.id,
            c.handle(),
            status,
            c.channel_title
        );
    }

    Ok(())
}

/// Runs the `channels add` subcommand.
///
/// # Errors
///
/// Returns an error if the handle is empty or the create request fails.
#[instrument(skip_all)]
async fn run_channels_add(handle: &str, dir: Option<&PathBuf>) -> Result<()> {
    let (_, mut store) = open_store(dir)?;
    let outcome = store.add_channel(handle).await;
    log_notifications(&mut store);

    match outcome? {
        AddChannelOutcome::Created(_) => Ok(()),
        AddChannelOutcome::Rejected => bail!("channel handle must not be empty"),
        AddChannelOutcome::Busy => bail!("another add request is in progress"),
    }
}

/// Runs the `signals list` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails.
#[instrument(skip_all)]
async fn run_signals_list(args: &SignalFilterArgs, dir: Option<&PathBuf>) -> Result<()> {
    let (_, store) = open_store(dir)?;
    let signals = store
        .service()
        .list_signals(&args.to_query())
        .await
        .context("failed to load signals")?;

    if signals.is_empty() {
        tracing::info!("No signals found.");
        return Ok(());
    }

    tracing::info!("Signals ({}):", signals.len());
    for s in &signals {
        tracing::info!(
            "  {:>6}  {:<8}  {:<5}  entry {}  target {}  stop {}  @{}  {}",
            s.id,
            s.ticker.as_deref().unwrap_or("-"),
            s.signal_type.label(),
            fmt_price(s.entry_price),
            fmt_price(s.target_price),
            fmt_price(s.stop_loss),
            s.channel_username,
            s.created_at
        );
    }

    Ok(())
}

fn fmt_price(price: Option<f64>) -> String {
    price.map_or_else(|| String::from("-"), |p| format!("{p:.2}"))
}

/// Runs the `signals delete` subcommand.
///
/// # Errors
///
/// Returns an error if the service cannot be reached.
#[instrument(skip_all)]
async fn run_signals_delete(id: i64, dir: Option<&PathBuf>) -> Result<()> {
    let (_, mut store) = open_store(dir)?;
    let deleted = store.delete_signal(id).await;
    log_notifications(&mut store);
    deleted
}

/// Runs the `signals ingest` subcommand.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the request fails.
#[instrument(skip_all)]
async fn run_signals_ingest(channel: &str, file: &Path, dir: Option<&PathBuf>) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let messages: Vec<RawMessage> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse messages from {}", file.display()))?;
    if messages.is_empty() {
        bail!("{} contains no messages", file.display());
    }

    let (_, mut store) = open_store(dir)?;
    let ingested = store.ingest_messages(channel, messages).await;
    log_notifications(&mut store);
    ingested.map(|_| ())
}

/// Runs the `scrape` subcommand.
///
/// # Errors
///
/// Returns an error if the scrape endpoint is not configured or the scrape fails.
#[instrument(skip_all)]
async fn run_scrape(dir: Option<&PathBuf>) -> Result<()> {
    let (_, mut store) = open_store(dir)?;
    let scraped = store.trigger_scrape().await;
    log_notifications(&mut store);
    scraped.map(|_| ())
}

/// Runs the `export` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails or the file cannot be written.
#[instrument(skip_all)]
async fn run_export(args: &ExportArgs, dir: Option<&PathBuf>) -> Result<()> {
    let (_, store) = open_store(dir)?;
    let filter = SignalFilterArgs {
        limit: None,
        ticker: args.ticker.clone(),
        channel: args.channel.clone(),
    };
    let signals = store
        .service()
        .list_signals(&filter.to_query())
        .await
        .context("failed to load signals")?;

    let refs: Vec<_> = signals.iter().collect();
    let format = ExportFormat::from(args.format);
    let records = export_to_path(format, &refs, &args.output)?;
    tracing::info!(
        "Exported {} signal(s) as {} to {}",
        records,
        format.label(),
        args.output.display()
    );

    Ok(())
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or serialized.
#[instrument(skip_all)]
fn run_config_show(dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;
    let content = toml::to_string_pretty(&config).context("failed to serialize config to TOML")?;

    tracing::info!("# {}", config_path.display());
    for line in content.lines() {
        tracing::info!("{line}");
    }

    Ok(())
}

/// Runs the `config set` subcommand.
///
/// # Errors
///
/// Returns an error if a URL is invalid or the config cannot be written.
#[instrument(skip_all)]
fn run_config_set(args: &ConfigSetArgs, dir: Option<&PathBuf>) -> Result<()> {
    if args.channels_url.is_none()
        && args.signals_url.is_none()
        && args.scrape_url.is_none()
        && args.timeout_secs.is_none()
    {
        bail!("nothing to set; pass at least one option");
    }

    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let mut config = AppConfig::load(&config_path).context("failed to load config")?;

    if let Some(url) = &args.channels_url {
        config.service.channels_url = Some(url.clone());
    }
    if let Some(url) = &args.signals_url {
        config.service.signals_url = Some(url.clone());
    }
    if let Some(url) = &args.scrape_url {
        config.service.scrape_url = Some(url.clone());
    }
    if let Some(secs) = args.timeout_secs {
        config.service.timeout_secs = secs;
    }

    // Reject invalid URLs before writing.
    if config.service.channels_url.is_some() {
        config.service.channels_endpoint()?;
    }
    if config.service.signals_url.is_some() {
        config.service.signals_endpoint()?;
    }
    config.service.scrape_endpoint()?;
    config.service.check_timeout()?;

    config.save(&config_path).context("failed to save config")?;
    tracing::info!("Saved {}", config_path.display());

    Ok(())
}

/// Initializes the tracing subscriber.
///
/// The dashboard logs to a file in the data directory so the alternate
/// screen stays intact; every other command logs to stdout.
///
/// # Errors
///
/// Returns an error if the dashboard log file cannot be opened.
fn init_tracing(command: &Commands, dir: Option<&PathBuf>) -> Result<()> {
    let writer = if matches!(command, Commands::Dashboard) {
        let data_dir = resolve_data_dir(dir).context("failed to resolve data directory")?;
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create directory {}", data_dir.display()))?;
        let path = data_dir.join(DASHBOARD_LOG_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Some(BoxMakeWriter::new(Mutex::new(file)))
    } else {
        None
    };
    let ansi = writer.is_none();
    let writer = writer.unwrap_or_else(|| BoxMakeWriter::new(std::io::stdout));

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(not(feature = "otel"))]
    {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(writer);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dir = cli.dir.as_ref();
    init_tracing(&cli.command, dir)?;

    match cli.command {
        Commands::Dashboard => run_dashboard(dir).await,
        Commands::Channels(cmd) => match cmd.command {
            ChannelsSubcommands::List { query } => run_channels_list(query.as_deref(), dir).await,
            ChannelsSubcommands::Add { handle } => run_channels_add(&handle, dir).await,
        },
        Commands::Signals(cmd) => match cmd.command {
            SignalsSubcommands::List(args) => run_signals_list(&args, dir).await,
            SignalsSubcommands::Delete { id } => run_signals_delete(id, dir).await,
            SignalsSubcommands::Ingest { channel, file } => {
                run_signals_ingest(&channel, &file, dir).await
            }
        },
        Commands::Scrape => run_scrape(dir).await,
        Commands::Export(args) => run_export(&args, dir).await,
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Show => run_config_show(dir),
            ConfigSubcommands::Set(args) => run_config_set(&args, dir),
        },
    }
}
