//! The JSON event vocabulary and scalar payloads.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar value about to be written to a sink.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// A JSON string.
    String(String),
    /// A signed integer that fits in 64 bits.
    Integer(i64),
    /// A double-precision float.
    Float(f64),
    /// An integer outside the `i64` range, as decimal digits.
    BigInteger(String),
    /// An arbitrary-precision decimal, as decimal text.
    BigDecimal(String),
    /// A JSON boolean.
    Bool(bool),
    /// JSON `null`.
    Null,
    /// An already-encoded JSON literal, written verbatim.
    Raw(String),
    /// Raw bytes; sinks encode them (base64 for [`crate::JsonWriter`]).
    Binary(Vec<u8>),
}

impl ScalarValue {
    /// Returns the text that value maskers operate on.
    ///
    /// Only strings and numbers have a maskable text form. Booleans, null,
    /// raw literals, and binary payloads return `None`.
    pub fn mask_text(&self) -> Option<Cow<'_, str>> {
        match self {
            ScalarValue::String(s) => Some(Cow::Borrowed(s)),
            ScalarValue::Integer(i) => Some(Cow::Owned(i.to_string())),
            ScalarValue::Float(f) => Some(Cow::Owned(f.to_string())),
            ScalarValue::BigInteger(s) | ScalarValue::BigDecimal(s) => Some(Cow::Borrowed(s)),
            ScalarValue::Bool(_) | ScalarValue::Null | ScalarValue::Raw(_) | ScalarValue::Binary(_) => {
                None
            }
        }
    }

    /// Whether this value can never be inspected by value maskers.
    pub fn is_opaque(&self) -> bool {
        matches!(self, ScalarValue::Raw(_) | ScalarValue::Binary(_))
    }

    /// Whether value maskers are consulted for this value (strings and numbers).
    pub fn is_value_maskable(&self) -> bool {
        matches!(
            self,
            ScalarValue::String(_)
                | ScalarValue::Integer(_)
                | ScalarValue::Float(_)
                | ScalarValue::BigInteger(_)
                | ScalarValue::BigDecimal(_)
        )
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ScalarValue::String(_) => "string",
            ScalarValue::Integer(_) => "integer",
            ScalarValue::Float(_) => "float",
            ScalarValue::BigInteger(_) => "big_integer",
            ScalarValue::BigDecimal(_) => "big_decimal",
            ScalarValue::Bool(_) => "bool",
            ScalarValue::Null => "null",
            ScalarValue::Raw(_) => "raw",
            ScalarValue::Binary(_) => "binary",
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::String(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(i: i64) -> Self {
        ScalarValue::Integer(i)
    }
}

impl From<u64> for ScalarValue {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => ScalarValue::Integer(i),
            Err(_) => ScalarValue::BigInteger(u.to_string()),
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(f: f64) -> Self {
        ScalarValue::Float(f)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

/// The substitute written in place of a masked value.
///
/// Deserializes from any JSON scalar. JSON `null` becomes [`MaskValue::Null`],
/// which is distinct from the four-character string `"null"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaskValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl MaskValue {
    /// Returns the replacement template if this mask is textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MaskValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Default for MaskValue {
    fn default() -> Self {
        MaskValue::String(crate::DEFAULT_MASK.to_string())
    }
}

impl From<&str> for MaskValue {
    fn from(s: &str) -> Self {
        MaskValue::String(s.to_string())
    }
}

impl From<String> for MaskValue {
    fn from(s: String) -> Self {
        MaskValue::String(s)
    }
}

impl From<MaskValue> for ScalarValue {
    fn from(mask: MaskValue) -> Self {
        match mask {
            MaskValue::Null => ScalarValue::Null,
            MaskValue::Bool(b) => ScalarValue::Bool(b),
            MaskValue::Integer(i) => ScalarValue::Integer(i),
            MaskValue::Float(f) => ScalarValue::Float(f),
            MaskValue::String(s) => ScalarValue::String(s),
        }
    }
}

impl fmt::Display for MaskValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskValue::Null => write!(f, "null"),
            MaskValue::Bool(b) => write!(f, "{}", b),
            MaskValue::Integer(i) => write!(f, "{}", i),
            MaskValue::Float(x) => write!(f, "{}", x),
            MaskValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// One event of the streaming JSON vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonEvent {
    BeginObject { size_hint: Option<usize> },
    EndObject,
    BeginArray { size_hint: Option<usize> },
    EndArray,
    FieldName(String),
    Scalar(ScalarValue),
    Flush,
}

impl JsonEvent {
    /// Shorthand for a string scalar event.
    pub fn string(s: impl Into<String>) -> Self {
        JsonEvent::Scalar(ScalarValue::String(s.into()))
    }

    /// Shorthand for a field-name event.
    pub fn field(name: impl Into<String>) -> Self {
        JsonEvent::FieldName(name.into())
    }
}
