//! Field maskers: decide from structural position alone.
//!
//! A field masker is consulted right after a field name has been written,
//! before anything about the field's value is known. The first masker that
//! returns a mask wins; field masking does not chain.

use std::collections::HashSet;
use std::fmt;

use crate::context::StreamContext;
use crate::path::PathPattern;
use crate::{MaskValue, Result};

/// Decides whether the value of the field at the current position is masked.
///
/// Implementations must be side-effect free. Returning an error aborts the
/// document; it is never treated as "not masked".
pub trait FieldMasker: Send + Sync + fmt::Debug {
    fn mask(&self, context: &StreamContext) -> Result<Option<MaskValue>>;
}

/// Masks fields whose position matches a [`PathPattern`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathBasedFieldMasker {
    pattern: PathPattern,
    mask: MaskValue,
}

impl PathBasedFieldMasker {
    pub fn new(pattern: PathPattern, mask: MaskValue) -> Self {
        Self { pattern, mask }
    }

    /// Parse `path` and build a masker for it.
    pub fn parse(path: &str, mask: MaskValue) -> Result<Self> {
        Ok(Self::new(PathPattern::parse(path)?, mask))
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn mask_value(&self) -> &MaskValue {
        &self.mask
    }
}

impl FieldMasker for PathBasedFieldMasker {
    fn mask(&self, context: &StreamContext) -> Result<Option<MaskValue>> {
        if self.pattern.matches(context) {
            Ok(Some(self.mask.clone()))
        } else {
            Ok(None)
        }
    }
}

/// Masks fields whose name is in a set, at any depth.
///
/// Equivalent to one single-literal [`PathBasedFieldMasker`] per name, all
/// sharing one mask, with a single hash lookup per field name.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNameSetMasker {
    names: HashSet<String>,
    mask: MaskValue,
}

impl FieldNameSetMasker {
    pub fn new<I, S>(names: I, mask: MaskValue) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            mask,
        }
    }

    pub fn names(&self) -> &HashSet<String> {
        &self.names
    }

    pub fn mask_value(&self) -> &MaskValue {
        &self.mask
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub(crate) fn insert(&mut self, name: String) {
        self.names.insert(name);
    }
}

impl FieldMasker for FieldNameSetMasker {
    fn mask(&self, context: &StreamContext) -> Result<Option<MaskValue>> {
        Ok(context
            .current_name()
            .filter(|name| self.names.contains(*name))
            .map(|_| self.mask.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_context(path: &[&str]) -> StreamContext {
        let mut ctx = StreamContext::new();
        for name in path {
            ctx.push_object().unwrap();
            ctx.set_field_name(name).unwrap();
        }
        ctx
    }

    #[test]
    fn path_masker_returns_mask_on_match() {
        let masker = PathBasedFieldMasker::parse("/user/password", MaskValue::from("x")).unwrap();
        let ctx = field_context(&["user", "password"]);
        assert_eq!(masker.mask(&ctx).unwrap(), Some(MaskValue::from("x")));

        let ctx = field_context(&["admin", "password"]);
        assert_eq!(masker.mask(&ctx).unwrap(), None);
    }

    #[test]
    fn path_masker_rejects_bad_path() {
        assert!(PathBasedFieldMasker::parse("", MaskValue::Null).is_err());
    }

    #[test]
    fn name_set_matches_at_any_depth() {
        let masker = FieldNameSetMasker::new(["password", "token"], MaskValue::Null);
        assert_eq!(
            masker.mask(&field_context(&["password"])).unwrap(),
            Some(MaskValue::Null)
        );
        assert_eq!(
            masker.mask(&field_context(&["a", "b", "token"])).unwrap(),
            Some(MaskValue::Null)
        );
        assert_eq!(masker.mask(&field_context(&["tokens"])).unwrap(), None);
    }

    #[test]
    fn name_set_ignores_array_positions() {
        let masker = FieldNameSetMasker::new(["0"], MaskValue::Null);
        let mut ctx = StreamContext::new();
        ctx.push_array().unwrap();
        assert_eq!(masker.mask(&ctx).unwrap(), None);
    }

    #[test]
    fn name_set_agrees_with_single_literal_paths() {
        let names = ["ssn", "a/b", "card"];
        let set = FieldNameSetMasker::new(names, MaskValue::from("*"));
        let paths: Vec<PathBasedFieldMasker> = names
            .iter()
            .map(|n| {
                PathBasedFieldMasker::parse(&crate::path::escape(n), MaskValue::from("*")).unwrap()
            })
            .collect();

        for probe in [
            vec!["ssn"],
            vec!["x", "a/b"],
            vec!["card", "number"],
            vec!["cards"],
        ] {
            let ctx = field_context(&probe);
            let from_set = set.mask(&ctx).unwrap();
            let from_paths = paths.iter().find_map(|m| m.mask(&ctx).unwrap());
            assert_eq!(from_set, from_paths, "disagreement at {:?}", probe);
        }
    }
}
