//! Logging configuration.
//!
//! Precedence, highest first: CLI flags, `LM_LOG*` variables, `RUST_LOG`,
//! built-in defaults.

use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable for the log level.
pub const ENV_LOG_LEVEL: &str = "LM_LOG";

/// Environment variable for the log format.
pub const ENV_LOG_FORMAT: &str = "LM_LOG_FORMAT";

/// Set to `0`/`false` to drop timestamps from human output.
pub const ENV_LOG_TIMESTAMPS: &str = "LM_LOG_TIMESTAMPS";

/// Set to `1`/`true` to show file and line in human output.
pub const ENV_LOG_SOURCE: &str = "LM_LOG_SOURCE";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable console format
    #[default]
    #[value(alias = "console", alias = "pretty")]
    Human,
    /// One JSON object per line
    #[value(alias = "json")]
    Jsonl,
}

/// Minimum level that gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[value(alias = "warning")]
    Warn,
    Error,
    #[value(alias = "none", alias = "quiet")]
    Off,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LevelFilter> for LogLevel {
    fn from(filter: LevelFilter) -> Self {
        match filter {
            LevelFilter::TRACE => LogLevel::Trace,
            LevelFilter::DEBUG => LogLevel::Debug,
            LevelFilter::INFO => LogLevel::Info,
            LevelFilter::WARN => LogLevel::Warn,
            LevelFilter::ERROR => LogLevel::Error,
            _ => LogLevel::Off,
        }
    }
}

/// Logging settings given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOverrides {
    pub level: Option<LogLevel>,
    pub format: Option<LogFormat>,
    /// Forces file/line output on; `false` leaves the environment in charge.
    pub source_location: bool,
}

/// Resolved logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// A `RUST_LOG` directive to use instead of `level`. Only kept when no
    /// explicit level was given.
    pub filter: Option<String>,
    /// Timestamps in human output.
    pub timestamps: bool,
    /// File and line in human output.
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            filter: None,
            timestamps: true,
            source_location: false,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment and CLI overrides.
    pub fn from_env(overrides: &LogOverrides) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Like [`LogConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F, overrides: &LogOverrides) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LogConfig::default();

        let env_level = lookup(ENV_LOG_LEVEL).and_then(|v| LogLevel::from_str(v.trim(), true).ok());
        match overrides.level.or(env_level) {
            Some(level) => config.level = level,
            None => {
                let directive = lookup("RUST_LOG").filter(|v| !v.trim().is_empty());
                if let Some(filter) = directive.as_deref().and_then(|d| EnvFilter::try_new(d).ok()) {
                    if let Some(hint) = filter.max_level_hint() {
                        config.level = hint.into();
                    }
                    config.filter = directive;
                }
            }
        }

        let env_format = lookup(ENV_LOG_FORMAT).and_then(|v| LogFormat::from_str(v.trim(), true).ok());
        if let Some(format) = overrides.format.or(env_format) {
            config.format = format;
        }

        if let Some(on) = lookup(ENV_LOG_TIMESTAMPS).as_deref().and_then(parse_flag) {
            config.timestamps = on;
        }
        config.source_location = overrides.source_location
            || lookup(ENV_LOG_SOURCE)
                .as_deref()
                .and_then(parse_flag)
                .unwrap_or(false);

        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn resolve(vars: &[(&str, &str)]) -> LogConfig {
        LogConfig::from_lookup(lookup(vars), &LogOverrides::default())
    }

    #[test]
    fn test_value_names_and_aliases() {
        assert_eq!(LogFormat::from_str("json", true), Ok(LogFormat::Jsonl));
        assert_eq!(LogFormat::from_str("HUMAN", true), Ok(LogFormat::Human));
        assert!(LogFormat::from_str("xml", true).is_err());
        assert_eq!(LogLevel::from_str("WARNING", true), Ok(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("quiet", true), Ok(LogLevel::Off));
        assert!(LogLevel::from_str("loud", true).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&[]);
        assert_eq!(config.format, LogFormat::Human);
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.filter.is_none());
        assert!(config.timestamps);
        assert!(!config.source_location);
    }

    #[test]
    fn test_lm_log_beats_rust_log() {
        let config = resolve(&[("LM_LOG", "error"), ("RUST_LOG", "trace")]);
        assert_eq!(config.level, LogLevel::Error);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_rust_log_kept_as_filter() {
        let config = resolve(&[("RUST_LOG", "warn,lm_mask=debug")]);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.filter.as_deref(), Some("warn,lm_mask=debug"));
    }

    #[test]
    fn test_invalid_rust_log_is_ignored() {
        let config = resolve(&[("RUST_LOG", "lm_core=notalevel")]);
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_cli_level_beats_rust_log() {
        let overrides = LogOverrides {
            level: Some(LogLevel::Off),
            ..LogOverrides::default()
        };
        let config = LogConfig::from_lookup(lookup(&[("RUST_LOG", "trace")]), &overrides);
        assert_eq!(config.level, LogLevel::Off);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_cli_overrides_env() {
        let overrides = LogOverrides {
            level: Some(LogLevel::Trace),
            format: Some(LogFormat::Human),
            source_location: true,
        };
        let config = LogConfig::from_lookup(
            lookup(&[("LM_LOG", "error"), ("LM_LOG_FORMAT", "jsonl"), ("LM_LOG_SOURCE", "0")]),
            &overrides,
        );
        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Human);
        assert!(config.source_location);
    }

    #[test]
    fn test_display_flags_from_env() {
        let config = resolve(&[("LM_LOG_TIMESTAMPS", "false"), ("LM_LOG_SOURCE", "yes")]);
        assert!(!config.timestamps);
        assert!(config.source_location);

        let config = resolve(&[("LM_LOG_TIMESTAMPS", "maybe")]);
        assert!(config.timestamps);
    }
}
