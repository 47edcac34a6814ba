//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a [`ConfigError`], if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(first) => Err(ConfigError::InvalidValue {
                field: first.path,
                message: first.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Timeouts above this are almost certainly a typo (seconds written as ms * 1000).
const LONG_TIMEOUT_MS: u64 = 30_000;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_timing(config, &mut result);
        Self::validate_selectors(config, &mut result);
        Self::validate_browser(config, &mut result);

        Ok(result)
    }

    fn validate_timing(config: &Config, result: &mut ValidationResult) {
        let timing = &config.timing;

        if timing.max_attempts == 0 {
            result.add_error(ValidationError::new(
                "timing.max_attempts",
                "max_attempts must be greater than 0",
            ));
        }

        if timing.max_attempts > 10 {
            result.add_warning(ValidationWarning::new(
                "timing.max_attempts",
                "max_attempts is very high (>10), a failing run will take a long time to report",
            ));
        }

        let timeouts = [
            ("timing.menu_timeout_ms", timing.menu_timeout_ms),
            ("timing.item_timeout_ms", timing.item_timeout_ms),
            ("timing.modal_timeout_ms", timing.modal_timeout_ms),
        ];
        for (path, value) in timeouts {
            if value == 0 {
                result.add_error(ValidationError::new(path, "timeout must be greater than 0"));
            } else if value > LONG_TIMEOUT_MS {
                result.add_warning(ValidationWarning::new(
                    path,
                    format!("timeout of {}ms is unusually long", value),
                ));
            }
        }

        if timing.toast_lifetime_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "timing.toast_lifetime_ms",
                "toast_lifetime_ms is 0, the confirmation toast will vanish immediately",
            ));
        }
    }

    fn validate_selectors(config: &Config, result: &mut ValidationResult) {
        let selectors = &config.selectors;
        let labels = [
            ("selectors.menu_label", &selectors.menu_label),
            ("selectors.trigger_label", &selectors.trigger_label),
            ("selectors.pick_phrase", &selectors.pick_phrase),
            ("selectors.submit_text", &selectors.submit_text),
        ];
        for (path, value) in labels {
            if value.trim().is_empty() {
                result.add_error(ValidationError::new(path, "value cannot be empty"));
            }
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.debug_port == 0 {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "Port cannot be 0",
            ));
        }

        let prefix = &config.browser.mail_url_prefix;
        if !prefix.starts_with("http://") && !prefix.starts_with("https://") {
            result.add_error(ValidationError::new(
                "browser.mail_url_prefix",
                "mail_url_prefix must start with http:// or https://",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
