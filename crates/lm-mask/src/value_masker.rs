//! Value maskers: decide from the content of a scalar.
//!
//! Value maskers chain. The transducer feeds the output of one masker into the
//! next, so layered rules (digits first, then e-mail addresses) all apply.

use std::fmt;

use regex::Regex;

use crate::context::StreamContext;
use crate::{MaskError, MaskValue, Result, ScalarValue};

/// Decides whether a scalar value (or part of it) is masked.
///
/// Returns `Ok(None)` to leave the value unchanged. Implementations must be
/// side-effect free; errors abort the document rather than letting the value
/// through.
pub trait ValueMasker: Send + Sync + fmt::Debug {
    fn mask(&self, context: &StreamContext, value: &ScalarValue) -> Result<Option<MaskValue>>;
}

/// Substitutes regex matches inside string and numeric values.
///
/// With a string mask, every match is replaced by the mask, which may refer to
/// capture groups (`$1`, `${name}`). With any other mask the whole value is
/// replaced by it as soon as the regex matches anywhere.
#[derive(Debug, Clone)]
pub struct RegexValueMasker {
    regex: Regex,
    mask: MaskValue,
}

impl RegexValueMasker {
    pub fn new(regex: Regex, mask: MaskValue) -> Self {
        Self { regex, mask }
    }

    /// Compile `pattern` and build a masker for it.
    pub fn parse(pattern: &str, mask: MaskValue) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| MaskError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::new(regex, mask))
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn mask_value(&self) -> &MaskValue {
        &self.mask
    }
}

impl ValueMasker for RegexValueMasker {
    fn mask(&self, _context: &StreamContext, value: &ScalarValue) -> Result<Option<MaskValue>> {
        let Some(text) = value.mask_text() else {
            return Ok(None);
        };
        if !self.regex.is_match(&text) {
            return Ok(None);
        }

        match &self.mask {
            MaskValue::String(replacement) => {
                let replaced = self.regex.replace_all(&text, replacement.as_str());
                if replaced == text {
                    Ok(None)
                } else {
                    Ok(Some(MaskValue::String(replaced.into_owned())))
                }
            }
            other => Ok(Some(other.clone())),
        }
    }
}
