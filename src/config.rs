use serde::Deserialize;
use std::fs;
use thiserror::Error;

use crate::matcher::FulfillmentPolicy;
use crate::parser::ParserOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// Mail relay endpoint; when absent notifications only go to the log.
    pub webhook_url: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_sender_name() -> String {
    "Wish Sniper".to_string()
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_seconds: default_timeout_seconds(),
            sender_name: default_sender_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Custom vocabulary JSON; the built-in one is used when absent.
    pub vocabulary_path: Option<String>,
    #[serde(default)]
    pub parser: ParserOptions,
    #[serde(default)]
    pub fulfillment: FulfillmentPolicy,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

fn default_database_path() -> String {
    "requests.db".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            vocabulary_path: None,
            parser: ParserOptions::default(),
            fulfillment: FulfillmentPolicy::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fulfillment.threshold == 0 {
            return Err(ConfigError::Invalid(
                "fulfillment.threshold must be at least 1".into(),
            ));
        }
        if self.notifier.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "notifier.timeout_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::ProgressCounter;

    #[test]
    fn empty_object_uses_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.database_path, "requests.db");
        assert!(config.parser.dedup_platforms);
        assert_eq!(config.fulfillment.threshold, 3);
        assert_eq!(config.fulfillment.counter, ProgressCounter::NotificationsSent);
        assert!(config.notifier.webhook_url.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let config = parse_config(
            r#"{
                "database_path": "test.db",
                "parser": { "dedup_platforms": false },
                "fulfillment": { "threshold": 1, "counter": "matched_products" },
                "notifier": { "webhook_url": "http://localhost:8025/send" }
            }"#,
        )
        .unwrap();
        assert!(!config.parser.dedup_platforms);
        assert_eq!(config.fulfillment.threshold, 1);
        assert_eq!(config.fulfillment.counter, ProgressCounter::MatchedProducts);
        assert_eq!(config.notifier.timeout_seconds, 10);
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let err = parse_config(r#"{ "fulfillment": { "threshold": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
