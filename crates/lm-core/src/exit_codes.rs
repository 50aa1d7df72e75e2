//! Exit codes for the lm-core CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Runtime errors

use lm_mask::MaskError;

use crate::config::ConfigError;

/// Exit codes for lm-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Masking configuration missing, unreadable, or invalid
    ConfigError = 11,

    // ========================================================================
    // Runtime Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,

    /// Input could not be masked (malformed or unbalanced document, masker failure)
    MaskingError = 22,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::MaskingError => "ERR_MASKING",
        }
    }

    /// `next` when this is `Clean`, otherwise this code.
    pub fn and(self, next: ExitCode) -> ExitCode {
        match self {
            ExitCode::Clean => next,
            failed => failed,
        }
    }

    /// Exit code for an error raised while masking input.
    pub fn for_mask_error(err: &MaskError) -> Self {
        match err {
            MaskError::Io(_) => ExitCode::IoError,
            e if e.is_config_error() => ExitCode::ConfigError,
            _ => ExitCode::MaskingError,
        }
    }
}

impl From<&ConfigError> for ExitCode {
    fn from(_: &ConfigError) -> Self {
        ExitCode::ConfigError
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
