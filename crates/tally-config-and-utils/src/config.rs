//! Configuration management for the client.

use crate::{short_id, CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default ingestion endpoint (can be overridden at compile time via TALLY_DEFAULT_INGEST_URL).
pub const DEFAULT_INGEST_URL: &str = match option_env!("TALLY_DEFAULT_INGEST_URL") {
    Some(url) => url,
    None => "https://analytics-ingress.quanta.tools/ee/",
};

/// Default application identifier baked in at compile time, if any.
pub const DEFAULT_APP_ID: Option<&str> = option_env!("TALLY_DEFAULT_APP_ID");

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Application identifier issued by the ingestion service.
    #[serde(default = "default_app_id")]
    pub app_id: Option<String>,
    /// Ingestion endpoint events are POSTed to.
    #[serde(default = "default_ingest_url")]
    pub ingest_url: String,
    /// Suppress the automatic "launch" event on start.
    #[serde(default)]
    pub skip_launch_event: bool,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_app_id() -> Option<String> {
    DEFAULT_APP_ID.map(|s| s.to_string())
}

fn default_ingest_url() -> String {
    DEFAULT_INGEST_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            app_id: default_app_id(),
            ingest_url: default_ingest_url(),
            skip_launch_event: false,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from `<base_dir>/config.json`, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from process environment variables.
    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Recognised variables: `TALLY_APP_ID`, `TALLY_INGEST_URL`,
    /// `TALLY_LOG_LEVEL`, `TALLY_SKIP_LAUNCH_EVENT`. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).and_then(non_empty);

        if let Some(app_id) = get("TALLY_APP_ID") {
            self.app_id = Some(app_id);
        }
        if let Some(url) = get("TALLY_INGEST_URL") {
            self.ingest_url = url;
        }
        if let Some(level) = get("TALLY_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(flag) = get("TALLY_SKIP_LAUNCH_EVENT") {
            self.skip_launch_event = parse_flag(&flag);
        }
    }

    /// The application identifier in its shortened wire form, if configured.
    pub fn app_id(&self) -> Option<String> {
        self.app_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(short_id::shorten)
    }

    /// Get the ingestion endpoint as a parsed URL.
    pub fn ingest_url(&self) -> CoreResult<Url> {
        let url = Url::parse(&self.ingest_url)?;
        match url.scheme() {
            "https" | "http" => Ok(url),
            other => Err(CoreError::Config(format!(
                "unsupported ingest URL scheme: {}",
                other
            ))),
        }
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Interprets yes/true/1-style flags by their first character.
fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().chars().next().map(|c| c.to_ascii_lowercase()),
        Some('y') | Some('t') | Some('1')
    )
}
