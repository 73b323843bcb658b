//! Configuration structs

mod app_config;

pub use app_config::{
    AggregationConfig, AppConfig, AppSettings, ConfigError, DatabaseConfig, Environment,
    RetryConfig, SlackConfig,
};
