//! Errors raised while loading or checking `config.toml`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// No file at the path. [`ConfigLoader::load_or_default`] falls back to
    /// defaults on this one only.
    ///
    /// [`ConfigLoader::load_or_default`]: crate::ConfigLoader::load_or_default
    #[error("No config file at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A `${VAR}` reference to an unset environment variable.
    #[error("Config references ${{{0}}}, which is not set")]
    EnvVarNotSet(String),

    /// The first error a validation pass reported.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
