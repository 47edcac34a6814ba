//! Mapping from the configuration file to the automation's own types.

use std::time::Duration;

use snooze_config::{Config, SelectorsConfig, TimingConfig};
use snooze_core::{AutomationTiming, Locators, SettleDelays};

pub(crate) fn timing(config: &TimingConfig) -> AutomationTiming {
    let ms = Duration::from_millis;
    AutomationTiming {
        menu_timeout: ms(config.menu_timeout_ms),
        item_timeout: ms(config.item_timeout_ms),
        modal_timeout: ms(config.modal_timeout_ms),
        menu_populate: ms(config.menu_populate_ms),
        settle: SettleDelays {
            after_open: ms(config.modal_settle_ms),
            before_submit: ms(config.submit_settle_ms),
        },
        retry_backoff: ms(config.retry_backoff_ms),
        max_attempts: config.max_attempts,
    }
}

pub(crate) fn locators(config: &SelectorsConfig) -> Locators {
    Locators::for_labels(
        &config.menu_label,
        &config.trigger_label,
        &config.pick_phrase,
        &config.submit_text,
    )
}

pub(crate) fn toast_lifetime(config: &TimingConfig) -> Duration {
    Duration::from_millis(config.toast_lifetime_ms)
}

/// Browser settings, with command-line overrides applied.
pub(crate) fn browser(
    config: &Config,
    port: Option<u16>,
    headless: bool,
) -> snooze_cdp::BrowserConfig {
    snooze_cdp::BrowserConfig {
        debug_port: port.unwrap_or(config.browser.debug_port),
        profile_dir: config.browser.profile_dir.clone(),
        headless: headless || config.browser.headless,
        mail_url_prefix: config.browser.mail_url_prefix.clone(),
    }
}
