//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;
use crate::grid::FieldSpec;

/// Quote and escape a string as a TOML basic string
fn quoted(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

impl Config {
    /// Serialize column definitions as `[[columns]]` entries
    pub(super) fn columns_to_toml(&self) -> String {
        let mut output = String::new();
        for spec in &self.columns {
            output.push_str(&column_to_toml(spec));
        }
        output
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        let data_path = match &self.data_path {
            Some(path) => format!("data_path = {}\n", quoted(&path.display().to_string())),
            None => "# data_path = \"./records.json\"   # JSON array of objects\n".to_string(),
        };

        format!(
            r#"# gridedit configuration

# Title shown above the table
title = {title}

# Dataset to load. Without one, the built-in sample table is used.
# Records may carry an integer "id"; rows without one are numbered by position.
{data_path}
# Where committed rows are sent
#   simulated - every save fails with "Simulated server error" (default)
#   local     - every save succeeds, nothing leaves the process
#   http      - rows are sent as JSON to `endpoint`
[persistence]
mode = {mode}
endpoint = {endpoint}
method = {method}   # put, post
timeout_secs = {timeout}

# Notification overlay
[notifications]
ttl_ms = {ttl_ms}
max_visible = {max_visible}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = {log_level}
# JSON log files (the TUI owns the terminal, so this is the only persistent log)
file_enabled = {log_file_enabled}
file_dir = {log_file_dir}
file_rotation = {log_file_rotation}  # hourly, daily, never
file_prefix = {log_file_prefix}

# ─────────────────────────────────────────────────────────────────────────────
# COLUMNS
# ─────────────────────────────────────────────────────────────────────────────
# type: text, checkbox, select (select requires options)
{columns}"#,
            title = quoted(&self.title),
            data_path = data_path,
            mode = quoted(self.persistence.mode.as_str()),
            endpoint = quoted(&self.persistence.endpoint),
            method = quoted(self.persistence.method.as_str()),
            timeout = self.persistence.timeout_secs,
            ttl_ms = self.notifications.ttl_ms,
            max_visible = self.notifications.max_visible,
            log_level = quoted(&self.logging.level),
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = quoted(&self.logging.file_dir.display().to_string()),
            log_file_rotation = quoted(self.logging.file_rotation.as_str()),
            log_file_prefix = quoted(&self.logging.file_prefix),
            columns = self.columns_to_toml(),
        )
    }
}

fn column_to_toml(spec: &FieldSpec) -> String {
    let mut output = String::from("\n[[columns]]\n");
    output.push_str(&format!("field = {}\n", quoted(&spec.field)));
    output.push_str(&format!("name = {}\n", quoted(&spec.display_name)));
    output.push_str(&format!("type = {}\n", quoted(spec.kind.as_str())));
    if let Some(options) = &spec.options {
        let items: Vec<String> = options.iter().map(|o| quoted(o)).collect();
        output.push_str(&format!("options = [{}]\n", items.join(", ")));
    }
    output
}
