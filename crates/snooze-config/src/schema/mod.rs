//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_infra;

pub use schema_infra::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub selectors: SelectorsConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Waits, timeouts and the retry policy of one automation run.
///
/// All durations are milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// How long to wait for the snooze menu after clicking its trigger.
    #[serde(default = "default_menu_timeout")]
    pub menu_timeout_ms: u64,

    /// How long to wait for the "pick date & time" item inside the menu.
    #[serde(default = "default_item_timeout")]
    pub item_timeout_ms: u64,

    /// How long to wait for the date & time dialog.
    #[serde(default = "default_modal_timeout")]
    pub modal_timeout_ms: u64,

    /// Pause after the menu is acquired, before looking for items.
    #[serde(default = "default_menu_populate")]
    pub menu_populate_ms: u64,

    /// Pause after the dialog appears, before reading its inputs.
    #[serde(default = "default_settle")]
    pub modal_settle_ms: u64,

    /// Pause between filling the inputs and pressing submit.
    #[serde(default = "default_settle")]
    pub submit_settle_ms: u64,

    /// Fixed pause between failed trigger attempts.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Trigger attempts before a run fails.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lifetime of the success toast.
    #[serde(default = "default_toast_lifetime")]
    pub toast_lifetime_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            menu_timeout_ms: default_menu_timeout(),
            item_timeout_ms: default_item_timeout(),
            modal_timeout_ms: default_modal_timeout(),
            menu_populate_ms: default_menu_populate(),
            modal_settle_ms: default_settle(),
            submit_settle_ms: default_settle(),
            retry_backoff_ms: default_retry_backoff(),
            max_attempts: default_max_attempts(),
            toast_lifetime_ms: default_toast_lifetime(),
        }
    }
}

fn default_menu_timeout() -> u64 {
    3000
}

fn default_item_timeout() -> u64 {
    1500
}

fn default_modal_timeout() -> u64 {
    3000
}

fn default_menu_populate() -> u64 {
    150
}

fn default_settle() -> u64 {
    100
}

fn default_retry_backoff() -> u64 {
    400
}

fn default_max_attempts() -> u32 {
    3
}

fn default_toast_lifetime() -> u64 {
    10_000
}

/// Host UI labels the element locators are built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorsConfig {
    /// Accessible label of the snooze menu.
    #[serde(default = "default_menu_label")]
    pub menu_label: String,

    /// Label or tooltip carried by the snooze trigger control.
    #[serde(default = "default_trigger_label")]
    pub trigger_label: String,

    /// Text of the menu item that opens the date & time dialog.
    #[serde(default = "default_pick_phrase")]
    pub pick_phrase: String,

    /// Visible text of the dialog's submit button.
    #[serde(default = "default_submit_text")]
    pub submit_text: String,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            menu_label: default_menu_label(),
            trigger_label: default_trigger_label(),
            pick_phrase: default_pick_phrase(),
            submit_text: default_submit_text(),
        }
    }
}

fn default_menu_label() -> String {
    "Snooze menu".to_string()
}

fn default_trigger_label() -> String {
    "Snooze".to_string()
}

fn default_pick_phrase() -> String {
    "Pick date & time".to_string()
}

fn default_submit_text() -> String {
    "Save".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
