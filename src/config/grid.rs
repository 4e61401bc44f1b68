//! Table columns and notification overlay settings

use crate::grid::FieldSpec;
use crate::notify::DEFAULT_TTL;
use serde::Deserialize;
use std::time::Duration;

/// The sample table's columns: name, age, city (select), active (checkbox)
pub fn default_columns() -> Vec<FieldSpec> {
    let cities = ["New York", "Los Angeles", "Chicago", "San Francisco"]
        .iter()
        .map(|c| c.to_string())
        .collect();

    vec![
        FieldSpec::text("name", "Full Name"),
        FieldSpec::text("age", "Age"),
        FieldSpec::select("city", "City", cities),
        FieldSpec::checkbox("active", "Status"),
    ]
}

/// Notification overlay configuration
#[derive(Debug, Clone)]
pub struct NotificationsConfig {
    /// Time-to-live for every posted notification
    pub ttl_ms: u64,
    /// Maximum notifications drawn at once (newest kept)
    pub max_visible: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL.as_millis() as u64,
            max_visible: 5,
        }
    }
}

/// Notification settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileNotifications {
    pub ttl_ms: Option<u64>,
    pub max_visible: Option<usize>,
}

impl NotificationsConfig {
    pub fn from_file(file: Option<FileNotifications>, env_ttl_ms: Option<u64>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            ttl_ms: env_ttl_ms.or(file.ttl_ms).unwrap_or(defaults.ttl_ms),
            max_visible: file.max_visible.unwrap_or(defaults.max_visible).max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}
