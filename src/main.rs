// gridedit - Editable data grid with save notifications
//
// Wires the pieces together:
// - Config: env > file > defaults, then command-line overrides
// - Logging: tracing into the TUI log buffer, optionally JSON files
// - Table: RowStore loaded from the dataset, column schema from config
// - Commit path: RowController over the configured persistence provider
// - TUI (ratatui): runs until the user quits

use anyhow::{Context, Result};
use clap::Parser;
use gridedit::cli::{self, Cli};
use gridedit::config::{Config, LogRotation};
use gridedit::controller::RowController;
use gridedit::dataset;
use gridedit::grid::RowStore;
use gridedit::logging::{LogBuffer, TuiLogLayer};
use gridedit::notify::NotificationCenter;
use gridedit::persistence::create_persistence;
use gridedit::startup::{self, StartupSummary};
use gridedit::tui::{self, app::App};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --reset, --path)
    let cli = Cli::parse();
    if cli::handle_cli(&cli) {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env();
    cli.apply_overrides(&mut config);

    // The TUI owns the terminal: logs go to the in-memory buffer, and
    // optionally to rotating JSON files.
    //
    // Precedence: RUST_LOG env var > config file > default "info"
    let log_buffer = LogBuffer::new();
    let default_filter = format!("gridedit={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // The guard must be kept alive for the duration of the program to ensure logs flush
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard> =
        if config.logging.file_enabled {
            match std::fs::create_dir_all(&config.logging.file_dir) {
                Ok(()) => {
                    let file_appender = match config.logging.file_rotation {
                        LogRotation::Hourly => tracing_appender::rolling::hourly(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                        LogRotation::Daily => tracing_appender::rolling::daily(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                        LogRotation::Never => tracing_appender::rolling::never(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                    };

                    // Wrap in non-blocking writer (writes happen in background thread)
                    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                    tracing_subscriber::registry()
                        .with(filter)
                        .with(TuiLogLayer::new(log_buffer.clone()))
                        .with(
                            tracing_subscriber::fmt::layer()
                                .json()
                                .with_writer(non_blocking)
                                .with_ansi(false),
                        )
                        .init();
                    Some(guard)
                }
                Err(e) => {
                    eprintln!(
                        "Warning: Could not create log directory {:?}: {}",
                        config.logging.file_dir, e
                    );
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(TuiLogLayer::new(log_buffer.clone()))
                        .init();
                    None
                }
            }
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(TuiLogLayer::new(log_buffer.clone()))
                .init();
            None
        };

    // Initial records: dataset file, or the built-in sample
    let (records, source) = match &config.data_path {
        Some(path) => (
            dataset::load_records(path)?,
            path.display().to_string(),
        ),
        None => (dataset::sample_records(), "built-in sample".to_string()),
    };

    let mut store = RowStore::new();
    let rows = store.load(records);

    let schema = config.schema();
    let problems = schema.problems();
    startup::log_startup(&StartupSummary {
        config: &config,
        rows,
        source,
        problems: &problems,
    });

    let persistence =
        create_persistence(&config.persistence).context("Failed to set up persistence")?;
    let notifications = NotificationCenter::new(config.notifications.ttl());
    let controller = RowController::new(store.shared(), notifications, persistence);

    let app = App::new(
        config.title.clone(),
        schema,
        controller,
        log_buffer,
        config.notifications.max_visible,
    );

    tracing::info!("Starting TUI");
    if let Err(e) = tui::run_tui(app).await {
        tracing::error!("TUI error: {:?}", e);
        return Err(e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
