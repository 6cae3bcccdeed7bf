use crate::config::schema::{SandboxConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        source: ValidationError,
    },
}

impl ConfigError {
    /// Attach the file a parse error came from.
    ///
    /// Validation is deferred to [`finalize`], after command-line roots are
    /// merged in, so only TOML errors carry a file path.
    fn with_path(self, path: &Path) -> Self {
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read sandbox config from {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse sandbox config TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse sandbox config TOML: {}", source),
            },
            ConfigError::Validation { source } => write!(f, "invalid sandbox config: {}", source),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Parse a config without validating it.
///
/// Roots may still be added from the command line, so an empty list is not
/// an error at this stage. Call [`finalize`] once all sources are merged.
pub fn parse_str(input: &str) -> Result<SandboxConfig, ConfigError> {
    toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml { path: None, source })
}

pub fn load_from_str(input: &str) -> Result<SandboxConfig, ConfigError> {
    let config = parse_str(input)?;
    finalize(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<SandboxConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&contents).map_err(|error| error.with_path(path))
}

/// Validate a fully merged config.
pub fn finalize(config: SandboxConfig) -> Result<SandboxConfig, ConfigError> {
    config
        .validate()
        .map_err(|source| ConfigError::Validation { source })?;
    Ok(config)
}
