//! Masking configuration resolution.
//!
//! Resolution order: CLI argument → `LM_MASK_CONFIG` → built-in defaults.
//!
//! An explicitly named file that does not exist is an error rather than a
//! silent fall-through to the defaults, since the defaults mask nothing.

use std::path::{Path, PathBuf};

use lm_mask::{MaskError, MaskingConfig};
use serde::Serialize;
use thiserror::Error;

/// Environment variable naming the masking config file.
pub const ENV_CONFIG_PATH: &str = "LM_MASK_CONFIG";

/// Where the masking configuration came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Errors while resolving or loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {} (from {origin})", path.display())]
    NotFound { path: PathBuf, origin: ConfigSource },

    #[error("failed to load config {}: {error}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        error: MaskError,
    },

    /// The config loaded but its rules do not compile.
    #[error("invalid masking rules: {0}")]
    Rules(#[source] MaskError),
}

/// A loaded configuration and where it came from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub config: MaskingConfig,
    pub source: ConfigSource,
    /// The file it was read from; `None` for built-in defaults.
    pub path: Option<PathBuf>,
}

/// Resolve and load the masking configuration.
pub fn resolve_config(cli_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    let env_path = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
    resolve_config_with(cli_path, env_path)
}

/// Like [`resolve_config`], with the environment value passed in.
pub fn resolve_config_with(
    cli_path: Option<&Path>,
    env_path: Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError> {
    let (path, source) = match (cli_path, env_path) {
        (Some(path), _) => (path.to_path_buf(), ConfigSource::CliArgument),
        (None, Some(path)) if !path.as_os_str().is_empty() => (path, ConfigSource::Environment),
        _ => {
            tracing::debug!("no masking config given, using builtin default");
            return Ok(ResolvedConfig::default());
        }
    };

    if !path.exists() {
        return Err(ConfigError::NotFound {
            path,
            origin: source,
        });
    }

    let config = MaskingConfig::load(&path).map_err(|error| ConfigError::Load {
        path: path.clone(),
        error,
    })?;
    tracing::debug!(path = %path.display(), source = %source, "loaded masking config");

    Ok(ResolvedConfig {
        config,
        source,
        path: Some(path),
    })
}
