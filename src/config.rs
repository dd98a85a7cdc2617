//! Configuration file handling.
//!
//! Credentials, service URLs and display preferences live in
//! `.brandbuddy.toml`. Nothing secret is compiled into the binary: a missing
//! analytics token or LLM key surfaces later as a "not configured" error.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".brandbuddy.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analytics query service connection.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Text-generation service connection.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Display preferences.
    #[serde(default)]
    pub preferences: Preferences,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding local state (workflow store).
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".brandbuddy")
}

/// Analytics query service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Bearer token. Empty means "not configured".
    #[serde(default)]
    pub token: String,

    /// Host of the analytics API, without the `/v0/pipes` suffix.
    #[serde(default = "default_analytics_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_analytics_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: default_analytics_url(),
            timeout_seconds: default_analytics_timeout(),
        }
    }
}

fn default_analytics_url() -> String {
    "https://api.us-east.aws.tinybird.co".to_string()
}

fn default_analytics_timeout() -> u64 {
    30
}

/// Chat-completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Bearer API key. Empty means "not configured".
    #[serde(default)]
    pub api_key: String,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in the completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_llm_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_llm_timeout() -> u64 {
    120
}

/// Display preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// chrono format string used for dates in reports.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// ISO currency code for financial impact.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Page shown when no subcommand is given.
    #[serde(default = "default_view")]
    pub default_view: String,

    /// Compact mode hides the raw row table.
    #[serde(default)]
    pub compact_mode: bool,

    /// Rows shown in a page's table.
    #[serde(default = "default_table_rows")]
    pub table_rows: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            currency: default_currency(),
            default_view: default_view(),
            compact_mode: false,
            table_rows: default_table_rows(),
        }
    }
}

fn default_date_format() -> String {
    "%m/%d/%Y".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_view() -> String {
    "dashboard".to_string()
}

fn default_table_rows() -> usize {
    10
}

/// Pages that may be chosen as `default_view`.
pub const VIEWS: &[&str] = &[
    "dashboard",
    "orders",
    "inventory",
    "inbound",
    "returns",
    "replenishment",
    "sla",
];

impl Preferences {
    /// Set a preference by key, validating the value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "date_format" => {
                if !crate::report::format::is_valid_date_format(value) {
                    bail!("date_format '{}' is not a valid strftime format", value);
                }
                self.date_format = value.to_string();
            }
            "currency" => {
                if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                    bail!("currency must be a three-letter code, got '{}'", value);
                }
                self.currency = value.to_uppercase();
            }
            "default_view" => {
                if !VIEWS.contains(&value) {
                    bail!("default_view must be one of: {}", VIEWS.join(", "));
                }
                self.default_view = value.to_string();
            }
            "compact_mode" => {
                self.compact_mode = value
                    .parse()
                    .with_context(|| format!("compact_mode must be true or false, got '{}'", value))?;
            }
            "table_rows" => {
                self.table_rows = value
                    .parse()
                    .with_context(|| format!("table_rows must be a number, got '{}'", value))?;
            }
            other => bail!("Unknown preference: {}", other),
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Write the configuration back to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Values from flags or environment variables take precedence over the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref token) = args.analytics_token {
            self.analytics.token = token.clone();
        }
        if let Some(ref url) = args.analytics_url {
            self.analytics.base_url = url.clone();
        }
        if let Some(ref key) = args.llm_api_key {
            self.llm.api_key = key.clone();
        }
        if let Some(ref url) = args.llm_url {
            self.llm.base_url = url.clone();
        }
        if let Some(ref model) = args.model {
            self.llm.model = model.clone();
        }
        if let Some(temperature) = args.temperature {
            self.llm.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.analytics.timeout_seconds = timeout;
            self.llm.timeout_seconds = timeout;
        }
        if let Some(ref dir) = args.state_dir {
            self.general.state_dir = dir.clone();
        }
        if args.compact {
            self.preferences.compact_mode = true;
        }
    }

    /// Check URLs and numeric ranges.
    pub fn validate(&self) -> Result<()> {
        validate_url("analytics.base_url", &self.analytics.base_url)?;
        validate_url("llm.base_url", &self.llm.base_url)?;

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!("llm.temperature must be between 0.0 and 2.0");
        }
        if self.analytics.timeout_seconds == 0 || self.llm.timeout_seconds == 0 {
            bail!("Timeouts must be at least 1 second");
        }
        if !VIEWS.contains(&self.preferences.default_view.as_str()) {
            bail!(
                "preferences.default_view must be one of: {}",
                VIEWS.join(", ")
            );
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).with_context(|| format!("{} is not a valid URL: {}", field, value))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => bail!("{} has unsupported scheme '{}'", field, scheme),
    }
}
