//! Infrastructure configuration types (browser connection, logging).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Chrome connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging port.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Launch Chrome headless when it is not already running.
    #[serde(default)]
    pub headless: bool,

    /// Chrome profile directory (keeps the mail session logged in).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<PathBuf>,

    /// URL prefix identifying the mail tab to attach to.
    #[serde(default = "default_mail_url_prefix")]
    pub mail_url_prefix: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: false,
            profile_dir: None,
            mail_url_prefix: default_mail_url_prefix(),
        }
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_mail_url_prefix() -> String {
    "https://mail.google.com/".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for the daily rolling log files.
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,

    /// Number of daily log files to keep.
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: default_log_dir(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".snooze-nl")
        .join("logs")
}

fn default_max_log_files() -> usize {
    14
}
