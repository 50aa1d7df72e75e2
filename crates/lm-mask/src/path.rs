//! Masking target paths.
//!
//! Grammar: tokens separated by `/`; a leading `/` anchors the path at the
//! document root; `*` matches any single field name or array index; inside a
//! token `~1` stands for a literal `/` and `~0` for a literal `~`. Any other
//! use of `~` is rejected.
//!
//! ```text
//! /user/password     only the top-level user's password
//! password           any field named password, at any depth
//! items/*/card       card under any element or field of items
//! a~1b               a field literally named "a/b"
//! ```

use std::fmt;

use crate::context::{Frame, StreamContext};
use crate::{MaskError, Result};

/// Path separator.
pub const SEPARATOR: char = '/';

/// Wildcard token.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Wildcard,
    Literal {
        name: String,
        // set when `name` is the canonical decimal form of an index
        index: Option<usize>,
    },
}

impl Token {
    fn parse(path: &str, raw: &str) -> Result<Self> {
        if raw == WILDCARD {
            return Ok(Token::Wildcard);
        }
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c == '~' && !matches!(chars.next(), Some('0' | '1')) {
                return Err(MaskError::invalid_pattern(
                    path,
                    format!("token {:?}: '~' must be followed by 0 or 1", raw),
                ));
            }
        }
        let name = unescape(raw);
        let index = name
            .parse::<usize>()
            .ok()
            .filter(|i| i.to_string() == name);
        Ok(Token::Literal { name, index })
    }

    fn matches(&self, frame: &Frame) -> bool {
        match self {
            Token::Wildcard => frame.has_position(),
            Token::Literal { name, index } => {
                if let Some(current) = frame.current_name() {
                    return current == name;
                }
                match (index, frame.current_index()) {
                    (Some(want), Some(have)) => *want == have,
                    _ => false,
                }
            }
        }
    }
}

/// A parsed masking path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    is_absolute: bool,
    tokens: Vec<Token>,
}

impl PathPattern {
    /// Parse a path string.
    ///
    /// Fails for an empty string and for a string made only of separators.
    /// Trailing empty tokens are dropped, so `a/b/` is the same as `a/b`.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(MaskError::invalid_pattern(path, "path is empty"));
        }

        let is_absolute = path.starts_with(SEPARATOR);
        let body = if is_absolute { &path[1..] } else { path };

        let mut raw_tokens: Vec<&str> = body.split(SEPARATOR).collect();
        while raw_tokens.last().is_some_and(|t| t.is_empty()) {
            raw_tokens.pop();
        }
        if raw_tokens.is_empty() {
            return Err(MaskError::invalid_pattern(path, "path has no tokens"));
        }

        let tokens = raw_tokens
            .into_iter()
            .map(|raw| Token::parse(path, raw))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            is_absolute,
            tokens,
        })
    }

    pub fn is_absolute(&self) -> bool {
        self.is_absolute
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.tokens.iter().any(|t| *t == Token::Wildcard)
    }

    /// True iff the pattern is one literal field name with no separators.
    pub fn is_single_literal_name(&self) -> bool {
        !self.is_absolute && self.tokens.len() == 1 && !self.has_wildcard()
    }

    /// The literal name of a single-literal pattern.
    pub fn single_literal_name(&self) -> Option<&str> {
        if !self.is_single_literal_name() {
            return None;
        }
        match &self.tokens[0] {
            Token::Literal { name, .. } => Some(name),
            Token::Wildcard => None,
        }
    }

    /// Match the pattern against the current ancestor chain.
    ///
    /// Tokens are compared right to left, starting at the current frame.
    pub fn matches(&self, context: &StreamContext) -> bool {
        let mut frames = context.ancestors();
        for token in self.tokens.iter().rev() {
            match frames.next() {
                Some(frame) if token.matches(frame) => {}
                _ => return false,
            }
        }
        if self.is_absolute {
            return frames.next().is_some_and(Frame::is_root);
        }
        true
    }
}

impl std::str::FromStr for PathPattern {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self> {
        PathPattern::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 || self.is_absolute {
                write!(f, "{}", SEPARATOR)?;
            }
            match token {
                Token::Wildcard => write!(f, "{}", WILDCARD)?,
                Token::Literal { name, .. } => write!(f, "{}", escape(name))?,
            }
        }
        Ok(())
    }
}

/// Resolve `~1` and `~0` escapes in a single token.
pub fn unescape(token: &str) -> String {
    if !token.contains('~') {
        return token.to_string();
    }
    token.replace("~1", "/").replace("~0", "~")
}

/// Escape a field name so it can be used as a path token.
pub fn escape(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}
