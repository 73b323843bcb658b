//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub slack: SlackConfig,
    pub database: DatabaseConfig,
    pub aggregation: AggregationConfig,
    pub retry: RetryConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Chat platform API configuration
#[derive(Clone, Deserialize)]
pub struct SlackConfig {
    pub token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Client-side pacing; 0 disables it
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    /// Fetch reactions per message when history omits them
    #[serde(default)]
    pub reactions_fallback: bool,
    /// Abort before ingesting when required scopes are missing
    #[serde(default = "default_true")]
    pub strict_scopes: bool,
}

impl SlackConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("page_limit", &self.page_limit)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("reactions_fallback", &self.reactions_fallback)
            .field("strict_scopes", &self.strict_scopes)
            .finish()
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Aggregation run configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default)]
    pub force_rescan: bool,
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
}

/// Retry policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_rate_limited: u32,
    #[serde(default = "default_rate_limit_margin_ms")]
    pub rate_limit_margin_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_network: u32,
    #[serde(default = "default_network_base_ms")]
    pub network_base_ms: u64,
    #[serde(default = "default_network_max_ms")]
    pub network_max_ms: u64,
    #[serde(default = "default_wait_secs")]
    pub default_wait_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_rate_limited: default_max_attempts(),
            rate_limit_margin_ms: default_rate_limit_margin_ms(),
            max_network: default_max_attempts(),
            network_base_ms: default_network_base_ms(),
            network_max_ms: default_network_max_ms(),
            default_wait_secs: default_wait_secs(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "reaction-aggregator".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_limit() -> u32 {
    200
}

fn default_requests_per_minute() -> u32 {
    50
}

fn default_database_url() -> String {
    "sqlite://slack_reactions.db".to_string()
}

fn default_max_connections() -> u32 {
    8
}

fn default_min_connections() -> u32 {
    1
}

fn default_window_days() -> u32 {
    365
}

fn default_max_workers() -> usize {
    8
}

fn default_lease_secs() -> u64 {
    300 // 5 minutes
}

fn default_max_attempts() -> u32 {
    5
}

fn default_rate_limit_margin_ms() -> u64 {
    1_000
}

fn default_network_base_ms() -> u64 {
    10_000
}

fn default_network_max_ms() -> u64 {
    120_000
}

fn default_wait_secs() -> u64 {
    10
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_or<T, F>(lookup: &F, name: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        None => Ok(default()),
    }
}

/// Boolean variables accept `true/false/1/0/yes/no`
fn flag_or<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue(name, raw)),
        },
        None => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or unparsable
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(raw) => {
                Environment::parse(&raw).ok_or(ConfigError::InvalidValue("APP_ENV", raw))?
            }
            None => default_env(),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            slack: SlackConfig {
                token: lookup("SLACK_USER_TOKEN")
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(ConfigError::MissingVar("SLACK_USER_TOKEN"))?,
                api_base_url: lookup("SLACK_API_BASE_URL").unwrap_or_else(default_api_base_url),
                timeout_secs: parse_or(&lookup, "SLACK_TIMEOUT_SECS", default_timeout_secs)?,
                page_limit: parse_or(&lookup, "SLACK_PAGE_LIMIT", default_page_limit)?,
                requests_per_minute: parse_or(
                    &lookup,
                    "SLACK_REQUESTS_PER_MINUTE",
                    default_requests_per_minute,
                )?,
                reactions_fallback: flag_or(&lookup, "SLACK_REACTIONS_FALLBACK", false)?,
                strict_scopes: flag_or(&lookup, "SLACK_STRICT_SCOPES", true)?,
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or_else(default_database_url),
                max_connections: parse_or(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    default_max_connections,
                )?,
                min_connections: parse_or(
                    &lookup,
                    "DATABASE_MIN_CONNECTIONS",
                    default_min_connections,
                )?,
            },
            aggregation: AggregationConfig {
                window_days: parse_or(&lookup, "AGGREGATION_WINDOW_DAYS", default_window_days)?,
                max_workers: parse_or(&lookup, "AGGREGATION_MAX_WORKERS", default_max_workers)?,
                force_rescan: flag_or(&lookup, "AGGREGATION_FORCE_RESCAN", false)?,
                lease_secs: parse_or(&lookup, "AGGREGATION_LEASE_SECS", default_lease_secs)?,
            },
            retry: RetryConfig {
                max_rate_limited: parse_or(&lookup, "RETRY_MAX_RATE_LIMITED", default_max_attempts)?,
                rate_limit_margin_ms: parse_or(
                    &lookup,
                    "RETRY_RATE_LIMIT_MARGIN_MS",
                    default_rate_limit_margin_ms,
                )?,
                max_network: parse_or(&lookup, "RETRY_MAX_NETWORK", default_max_attempts)?,
                network_base_ms: parse_or(&lookup, "RETRY_NETWORK_BASE_MS", default_network_base_ms)?,
                network_max_ms: parse_or(&lookup, "RETRY_NETWORK_MAX_MS", default_network_max_ms)?,
                default_wait_secs: parse_or(&lookup, "RETRY_DEFAULT_WAIT_SECS", default_wait_secs)?,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
