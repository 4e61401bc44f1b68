//! Persistence provider selection
//!
//! `simulated` stands in for a backend that rejects every save,
//! `local` accepts everything, `http` sends rows to `endpoint`.

use serde::Deserialize;

/// Which provider handles commits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistenceMode {
    /// Always rejects with "Simulated server error" (default)
    #[default]
    Simulated,
    /// Always accepts, nothing leaves the process
    Local,
    /// Sends the row to the configured endpoint
    Http,
}

impl PersistenceMode {
    /// Parse mode string from config or env, `None` for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simulated" | "demo" => Some(Self::Simulated),
            "local" => Some(Self::Local),
            "http" => Some(Self::Http),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Local => "local",
            Self::Http => "http",
        }
    }
}

/// HTTP verb used for updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Put,
    Post,
}

impl HttpMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "put" => Some(Self::Put),
            "post" => Some(Self::Post),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Post => "post",
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    pub mode: PersistenceMode,
    /// Update endpoint for `http` mode
    pub endpoint: String,
    pub method: HttpMethod,
    /// Request timeout for `http` mode
    pub timeout_secs: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            mode: PersistenceMode::Simulated,
            endpoint: "http://127.0.0.1:8080/api/v1/dictionary/updatex".to_string(),
            method: HttpMethod::Put,
            timeout_secs: 10,
        }
    }
}

/// Persistence settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FilePersistence {
    pub mode: Option<String>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl PersistenceConfig {
    /// Create from file config with env overrides for mode and endpoint
    pub fn from_file(
        file: Option<FilePersistence>,
        env_mode: Option<String>,
        env_endpoint: Option<String>,
    ) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let mode = env_mode
            .or(file.mode)
            .map(|s| {
                PersistenceMode::parse(&s).unwrap_or_else(|| {
                    eprintln!("Unknown persistence mode '{}', using simulated", s);
                    PersistenceMode::Simulated
                })
            })
            .unwrap_or(defaults.mode);

        Self {
            mode,
            endpoint: env_endpoint.or(file.endpoint).unwrap_or(defaults.endpoint),
            method: file
                .method
                .as_deref()
                .and_then(HttpMethod::parse)
                .unwrap_or(defaults.method),
            timeout_secs: file.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }
}
