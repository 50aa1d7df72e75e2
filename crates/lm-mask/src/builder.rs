//! Assembly of the effective masker lists.
//!
//! The builder collects declarative rules (paths, regexes, mask values) and
//! explicit masker instances, and produces a [`MaskerSet`]: the ordered field
//! and value masker lists one transducer consults. Building compiles every
//! path and regex up front, so a bad rule fails here and never at stream time.
//!
//! Single-literal paths (`password`, `ssn`) are collapsed into one
//! [`FieldNameSetMasker`] per distinct mask value. Everything else becomes its
//! own [`PathBasedFieldMasker`]. The resulting field list is ordered as
//! name-set maskers, then path maskers in configuration order, then custom
//! field maskers.

use std::sync::Arc;

use serde::Serialize;

use crate::field::{FieldMasker, FieldNameSetMasker, PathBasedFieldMasker};
use crate::path::PathPattern;
use crate::sink::JsonSink;
use crate::transducer::MaskingTransducer;
use crate::value_masker::{RegexValueMasker, ValueMasker};
use crate::{MaskValue, Result};

/// Mask written when a rule does not name its own.
pub const DEFAULT_MASK: &str = "****";

/// Counts describing a built [`MaskerSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaskerSetStats {
    /// Number of field-name set maskers.
    pub name_set_maskers: usize,
    /// Total distinct field names across the name sets.
    pub masked_names: usize,
    /// Number of path-based field maskers.
    pub path_maskers: usize,
    /// Number of regex value maskers.
    pub regex_maskers: usize,
    /// Number of caller-supplied field maskers.
    pub custom_field_maskers: usize,
    /// Number of caller-supplied value maskers.
    pub custom_value_maskers: usize,
}

/// The immutable, shareable result of a build.
///
/// A `MaskerSet` is `Send + Sync` and is meant to be built once and read by
/// every transducer, on any thread, without locking.
#[derive(Debug, Clone, Default)]
pub struct MaskerSet {
    field_maskers: Vec<Arc<dyn FieldMasker>>,
    value_maskers: Vec<Arc<dyn ValueMasker>>,
    stats: MaskerSetStats,
}

impl MaskerSet {
    /// A set that masks nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn field_maskers(&self) -> &[Arc<dyn FieldMasker>] {
        &self.field_maskers
    }

    pub fn value_maskers(&self) -> &[Arc<dyn ValueMasker>] {
        &self.value_maskers
    }

    pub fn is_empty(&self) -> bool {
        self.field_maskers.is_empty() && self.value_maskers.is_empty()
    }

    pub fn stats(&self) -> MaskerSetStats {
        self.stats
    }

    /// Start a transducer that masks into `sink` with this set.
    pub fn transducer<S: JsonSink>(&self, sink: S) -> MaskingTransducer<'_, S> {
        MaskingTransducer::new(self, sink)
    }
}

#[derive(Debug, Clone)]
struct Rule {
    patterns: Vec<String>,
    mask: Option<MaskValue>,
}

/// Declarative builder for a [`MaskerSet`].
#[derive(Debug, Clone, Default)]
pub struct MaskerSetBuilder {
    default_mask: MaskValue,
    path_rules: Vec<Rule>,
    value_rules: Vec<Rule>,
    field_maskers: Vec<Arc<dyn FieldMasker>>,
    value_maskers: Vec<Arc<dyn ValueMasker>>,
}

impl MaskerSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask used by rules that do not carry their own.
    pub fn default_mask(mut self, mask: impl Into<MaskValue>) -> Self {
        self.default_mask = mask.into();
        self
    }

    /// Mask the field at `path` with the default mask.
    pub fn mask_path(self, path: impl Into<String>) -> Self {
        self.mask_paths([path])
    }

    /// Mask every path in `paths` with the default mask.
    pub fn mask_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_rules.push(Rule {
            patterns: paths.into_iter().map(Into::into).collect(),
            mask: None,
        });
        self
    }

    /// Mask every path in `paths` with `mask`.
    pub fn mask_paths_with<I, S>(mut self, paths: I, mask: impl Into<MaskValue>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_rules.push(Rule {
            patterns: paths.into_iter().map(Into::into).collect(),
            mask: Some(mask.into()),
        });
        self
    }

    /// Mask matches of `regex` inside values with the default mask.
    pub fn mask_value(self, regex: impl Into<String>) -> Self {
        self.mask_values([regex])
    }

    /// Mask matches of every regex in `regexes` with the default mask.
    pub fn mask_values<I, S>(mut self, regexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_rules.push(Rule {
            patterns: regexes.into_iter().map(Into::into).collect(),
            mask: None,
        });
        self
    }

    /// Mask matches of every regex in `regexes` with `mask`.
    pub fn mask_values_with<I, S>(mut self, regexes: I, mask: impl Into<MaskValue>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_rules.push(Rule {
            patterns: regexes.into_iter().map(Into::into).collect(),
            mask: Some(mask.into()),
        });
        self
    }

    /// Append a custom field masker, consulted after the built-in ones.
    pub fn field_masker(mut self, masker: Arc<dyn FieldMasker>) -> Self {
        self.field_maskers.push(masker);
        self
    }

    /// Append a custom value masker, applied after the built-in ones.
    pub fn value_masker(mut self, masker: Arc<dyn ValueMasker>) -> Self {
        self.value_maskers.push(masker);
        self
    }

    /// Compile every rule into a [`MaskerSet`].
    ///
    /// Building does not consume the builder; building twice yields sets that
    /// behave identically.
    pub fn build(&self) -> Result<MaskerSet> {
        let mut name_sets: Vec<FieldNameSetMasker> = Vec::new();
        let mut path_maskers: Vec<PathBasedFieldMasker> = Vec::new();

        for rule in &self.path_rules {
            let mask = rule.mask.as_ref().unwrap_or(&self.default_mask);
            for path in &rule.patterns {
                let pattern = PathPattern::parse(path)?;
                if let Some(name) = pattern.single_literal_name() {
                    match name_sets.iter_mut().find(|set| set.mask_value() == mask) {
                        Some(set) => set.insert(name.to_string()),
                        None => name_sets.push(FieldNameSetMasker::new([name], mask.clone())),
                    }
                } else {
                    let masker = PathBasedFieldMasker::new(pattern, mask.clone());
                    if !path_maskers.contains(&masker) {
                        path_maskers.push(masker);
                    }
                }
            }
        }

        let mut regex_maskers: Vec<RegexValueMasker> = Vec::new();
        for rule in &self.value_rules {
            let mask = rule.mask.as_ref().unwrap_or(&self.default_mask);
            for pattern in &rule.patterns {
                regex_maskers.push(RegexValueMasker::parse(pattern, mask.clone())?);
            }
        }

        let stats = MaskerSetStats {
            name_set_maskers: name_sets.len(),
            masked_names: name_sets.iter().map(FieldNameSetMasker::len).sum(),
            path_maskers: path_maskers.len(),
            regex_maskers: regex_maskers.len(),
            custom_field_maskers: self.field_maskers.len(),
            custom_value_maskers: self.value_maskers.len(),
        };
        tracing::debug!(
            name_set_maskers = stats.name_set_maskers,
            masked_names = stats.masked_names,
            path_maskers = stats.path_maskers,
            regex_maskers = stats.regex_maskers,
            custom_field_maskers = stats.custom_field_maskers,
            custom_value_maskers = stats.custom_value_maskers,
            "built masker set"
        );

        let mut field_maskers: Vec<Arc<dyn FieldMasker>> = Vec::new();
        for set in name_sets {
            field_maskers.push(Arc::new(set));
        }
        for masker in path_maskers {
            field_maskers.push(Arc::new(masker));
        }
        field_maskers.extend(self.field_maskers.iter().cloned());

        let mut value_maskers: Vec<Arc<dyn ValueMasker>> = Vec::new();
        for masker in regex_maskers {
            value_maskers.push(Arc::new(masker));
        }
        value_maskers.extend(self.value_maskers.iter().cloned());

        Ok(MaskerSet {
            field_maskers,
            value_maskers,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MaskError;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn masker_set_is_shareable() {
        assert_send_sync::<MaskerSet>();
        assert_send_sync::<Arc<MaskerSet>>();
    }

    #[test]
    fn empty_builder_builds_empty_set() {
        let set = MaskerSetBuilder::new().build().unwrap();
        assert!(set.is_empty());
        assert_eq!(set.stats(), MaskerSetStats::default());
    }

    #[test]
    fn single_names_collapse_per_mask_value() {
        let set = MaskerSetBuilder::new()
            .mask_paths(["password", "token", "ssn"])
            .mask_paths_with(["pin"], MaskValue::Null)
            .mask_paths_with(["cvv"], MaskValue::Null)
            .mask_path("password")
            .build()
            .unwrap();

        let stats = set.stats();
        assert_eq!(stats.name_set_maskers, 2);
        assert_eq!(stats.masked_names, 5);
        assert_eq!(stats.path_maskers, 0);
        assert_eq!(set.field_maskers().len(), 2);
    }

    #[test]
    fn multi_token_and_wildcard_paths_stay_separate() {
        let set = MaskerSetBuilder::new()
            .mask_paths(["/user/password", "a/*/c", "*", "/top", "/user/password"])
            .build()
            .unwrap();
        let stats = set.stats();
        assert_eq!(stats.name_set_maskers, 0);
        assert_eq!(stats.path_maskers, 4);
    }

    #[test]
    fn custom_maskers_come_last() {
        #[derive(Debug)]
        struct Never;
        impl FieldMasker for Never {
            fn mask(&self, _: &crate::StreamContext) -> Result<Option<MaskValue>> {
                Ok(None)
            }
        }

        let set = MaskerSetBuilder::new()
            .field_masker(Arc::new(Never))
            .mask_paths(["a", "/b/c"])
            .build()
            .unwrap();
        assert_eq!(set.field_maskers().len(), 3);
        assert_eq!(format!("{:?}", set.field_maskers()[2]), "Never");
        assert_eq!(set.stats().custom_field_maskers, 1);
    }

    #[test]
    fn default_mask_applies_to_rules_without_mask() {
        let set = MaskerSetBuilder::new()
            .mask_path("a")
            .default_mask("[hidden]")
            .build()
            .unwrap();
        let out = crate::mask_str(r#"{"a":1}"#, &set).unwrap();
        assert_eq!(out, r#"{"a":"[hidden]"}"#);
    }

    #[test]
    fn bad_path_fails_build() {
        let err = MaskerSetBuilder::new()
            .mask_paths(["ok", "/"])
            .build()
            .unwrap_err();
        assert!(matches!(err, MaskError::InvalidPattern { .. }));
    }

    #[test]
    fn bad_regex_fails_build() {
        let err = MaskerSetBuilder::new()
            .mask_values(["[a-"])
            .build()
            .unwrap_err();
        assert!(matches!(err, MaskError::InvalidRegex { .. }));
    }

    #[test]
    fn building_twice_behaves_identically() {
        let builder = MaskerSetBuilder::new()
            .mask_paths(["password", "/a/*/c"])
            .mask_values([r"\d{3}"]);
        let first = builder.build().unwrap();
        let second = builder.build().unwrap();

        let doc = r#"{"password":"x","a":{"k":{"c":[1,2]}},"n":"call 5551234"}"#;
        assert_eq!(
            crate::mask_str(doc, &first).unwrap(),
            crate::mask_str(doc, &second).unwrap()
        );
        assert_eq!(first.stats(), second.stats());
    }
}
