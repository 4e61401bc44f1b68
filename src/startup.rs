// Startup module - boot summary in the log
//
// The TUI takes over the screen immediately, so the summary goes through
// tracing and shows up in the JSON log file (and the status bar for
// warnings).

use crate::config::{Config, VERSION};
use crate::grid::ConfigurationError;

/// What was loaded, for the boot summary
pub struct StartupSummary<'a> {
    pub config: &'a Config,
    /// Number of rows in the table
    pub rows: usize,
    /// Where the rows came from
    pub source: String,
    pub problems: &'a [ConfigurationError],
}

impl StartupSummary<'_> {
    /// Summary lines, one per logged message
    pub fn lines(&self) -> Vec<String> {
        let config = self.config;
        let mut lines = vec![
            format!("gridedit v{}", VERSION),
            format!("Table '{}': {} rows from {}", config.title, self.rows, self.source),
            format!(
                "Columns: {}",
                config
                    .columns
                    .iter()
                    .map(|c| format!("{} ({})", c.display_name, c.kind.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ];

        let persistence = &config.persistence;
        lines.push(match persistence.mode {
            crate::config::PersistenceMode::Http => format!(
                "Persistence: http {} {} (timeout {}s)",
                persistence.method.as_str().to_uppercase(),
                persistence.endpoint,
                persistence.timeout_secs
            ),
            mode => format!("Persistence: {}", mode.as_str()),
        });

        lines.push(format!(
            "Notifications: {}ms, up to {} visible",
            config.notifications.ttl_ms, config.notifications.max_visible
        ));
        lines
    }
}

/// Log the boot summary; configuration problems are warnings
pub fn log_startup(summary: &StartupSummary<'_>) {
    for line in summary.lines() {
        tracing::info!("{}", line);
    }
    for problem in summary.problems {
        tracing::warn!("Column configuration: {}", problem);
    }
    tracing::info!("Ready");
}
