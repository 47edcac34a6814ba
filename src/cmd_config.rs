//! Config subcommand.

use std::path::Path;

use snooze_config::{Config, ConfigLoader, ConfigValidator};

/// Print the effective configuration followed by its validation report.
pub(crate) fn show(config: &Config, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let source = path
        .map(Path::to_path_buf)
        .unwrap_or_else(ConfigLoader::default_path);
    println!("# Source: {}", source.display());
    println!("{}", toml::to_string_pretty(config)?);

    let report = ConfigValidator::validate(config)?;
    for error in &report.errors {
        println!("error:   {}: {}", error.path, error.message);
    }
    for warning in &report.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    if report.is_valid() {
        println!("Configuration is valid.");
        Ok(())
    } else {
        Err(format!("{} configuration error(s)", report.errors.len()).into())
    }
}
