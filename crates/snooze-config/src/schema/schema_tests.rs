use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.timing.max_attempts, 3);
    assert_eq!(config.selectors.menu_label, "Snooze menu");
    assert_eq!(config.browser.debug_port, 9222);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_timing_config_default() {
    let timing = TimingConfig::default();
    assert_eq!(timing.menu_timeout_ms, 3000);
    assert_eq!(timing.item_timeout_ms, 1500);
    assert_eq!(timing.modal_timeout_ms, 3000);
    assert_eq!(timing.modal_settle_ms, 100);
    assert_eq!(timing.submit_settle_ms, 100);
    assert_eq!(timing.toast_lifetime_ms, 10_000);
}

#[test]
fn test_selectors_config_default() {
    let selectors = SelectorsConfig::default();
    assert_eq!(selectors.trigger_label, "Snooze");
    assert_eq!(selectors.pick_phrase, "Pick date & time");
    assert_eq!(selectors.submit_text, "Save");
}

#[test]
fn test_browser_config_default() {
    let browser = BrowserConfig::default();
    assert!(!browser.headless);
    assert!(browser.profile_dir.is_none());
    assert!(browser.mail_url_prefix.starts_with("https://mail.google.com"));
}

#[test]
fn test_logging_config_default() {
    let logging = LoggingConfig::default();
    assert_eq!(logging.max_files, 14);
    assert!(logging.directory.ends_with("logs"));
}

#[test]
fn test_partial_timing_keeps_other_defaults() {
    let config: Config = toml::from_str(
        r#"
        [timing]
        max_attempts = 5
        "#,
    )
    .unwrap();
    assert_eq!(config.timing.max_attempts, 5);
    assert_eq!(config.timing.menu_timeout_ms, 3000);
}

#[test]
fn test_config_serialization_roundtrip() {
    let config = Config::default();
    let serialized = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&serialized).unwrap();
    assert_eq!(parsed.selectors.pick_phrase, config.selectors.pick_phrase);
    assert_eq!(parsed.timing.retry_backoff_ms, config.timing.retry_backoff_ms);
}
