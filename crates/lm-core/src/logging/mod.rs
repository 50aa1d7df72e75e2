//! Structured logging for lm-core, masked by the active masker set.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for pipelines
//!
//! In both modes every field passes through the same [`MaskerSet`] used for
//! payload masking before it reaches stderr.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use lm_core::logging::{init_logging, LogConfig, LogOverrides};
//!
//! let masks = Arc::new(config.builder().build()?);
//! init_logging(&LogConfig::from_env(&LogOverrides::default()), masks)?;
//! tracing::info!(password = "hunter2", "login"); // password=****
//! ```
//!
//! stdout is reserved for command payloads; logs always go to stderr.

pub mod config;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel, LogOverrides};
pub use layer::{mask_fields, MaskingFields, MaskingJsonlLayer};

use std::io::IsTerminal;
use std::sync::Arc;

use lm_mask::MaskerSet;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directive for the given level.
fn default_directive(level: LogLevel) -> String {
    format!("lm_core={0},lm_mask={0}", level)
}

/// Initialize the logging subsystem.
///
/// Call once at startup. A `RUST_LOG` directive carried by the config replaces
/// the level-derived filter. Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig, masks: Arc<MaskerSet>) -> Result<(), TryInitError> {
    let filter = config
        .filter
        .as_deref()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(config.level)));

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .fmt_fields(MaskingFields::new(masks))
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(MaskingJsonlLayer::stderr(masks))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_both_crates() {
        assert_eq!(default_directive(LogLevel::Debug), "lm_core=debug,lm_mask=debug");
        assert_eq!(default_directive(LogLevel::Off), "lm_core=off,lm_mask=off");
    }

    #[test]
    fn test_default_directive_parses() {
        for level in [LogLevel::Trace, LogLevel::Info, LogLevel::Off] {
            assert!(EnvFilter::try_new(default_directive(level)).is_ok());
        }
    }
}
