//! Error types for the masking engine.

use thiserror::Error;

/// Result type for masking operations.
pub type Result<T> = std::result::Result<T, MaskError>;

/// Errors that can occur while building maskers or masking a stream.
#[derive(Error, Debug)]
pub enum MaskError {
    /// A path string could not be parsed.
    #[error("invalid path pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A value-mask regex failed to compile.
    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The event stream does not nest correctly.
    ///
    /// This is a producer bug. The transducer never clamps its state to
    /// recover, since that could misclassify later events.
    #[error("unbalanced event stream: {0}")]
    Unbalanced(String),

    /// A custom field or value masker failed.
    #[error("masker error: {0}")]
    Masker(String),

    /// Failed to load or interpret configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error from the sink or a config file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MaskError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        MaskError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unbalanced(message: impl Into<String>) -> Self {
        MaskError::Unbalanced(message.into())
    }

    /// Whether this error was raised while building configuration, as opposed
    /// to while processing a stream.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            MaskError::InvalidPattern { .. } | MaskError::InvalidRegex { .. } | MaskError::Config(_)
        )
    }
}
