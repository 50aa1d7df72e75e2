//! Declarative masking configuration.
//!
//! A [`MaskingConfig`] is the on-disk form of a [`MaskerSetBuilder`]: lists of
//! paths and regexes, each list optionally carrying its own mask. Files are
//! JSON or TOML, chosen by extension.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{MaskError, MaskValue, MaskerSetBuilder, Result};

/// Schema version for the config file.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Masking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskingConfig {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Mask used by `paths`, `values`, and rules without their own mask.
    #[serde(default)]
    pub default_mask: MaskValue,

    /// Paths masked with the default mask.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Path lists with their own mask.
    #[serde(default)]
    pub path_masks: Vec<PathMaskRule>,

    /// Value regexes masked with the default mask.
    #[serde(default)]
    pub values: Vec<String>,

    /// Value regex lists with their own mask.
    #[serde(default)]
    pub value_masks: Vec<ValueMaskRule>,
}

fn default_schema_version() -> String {
    CONFIG_SCHEMA_VERSION.to_string()
}

/// A list of paths sharing one mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMaskRule {
    pub paths: Vec<String>,
    /// Falls back to the config's default mask when absent.
    #[serde(
        default,
        deserialize_with = "present_mask",
        skip_serializing_if = "Option::is_none"
    )]
    pub mask: Option<MaskValue>,
}

/// A list of value regexes sharing one mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMaskRule {
    pub values: Vec<String>,
    #[serde(
        default,
        deserialize_with = "present_mask",
        skip_serializing_if = "Option::is_none"
    )]
    pub mask: Option<MaskValue>,
}

// An explicit `"mask": null` is the null mask, not "use the default".
fn present_mask<'de, D>(deserializer: D) -> std::result::Result<Option<MaskValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    MaskValue::deserialize(deserializer).map(Some)
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_mask: MaskValue::default(),
            paths: Vec::new(),
            path_masks: Vec::new(),
            values: Vec::new(),
            value_masks: Vec::new(),
        }
    }
}

impl MaskingConfig {
    /// Load a config from a `.json` or `.toml` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match extension(path).as_deref() {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("toml") => Self::from_toml_str(&content),
            other => Err(MaskError::Config(format!(
                "unsupported config format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MaskError::Config(e.to_string()))
    }

    /// Save the config as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Whether the config names no rules at all.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
            && self.values.is_empty()
            && self.path_masks.iter().all(|r| r.paths.is_empty())
            && self.value_masks.iter().all(|r| r.values.is_empty())
    }

    /// A builder carrying every rule in this config.
    ///
    /// Custom maskers can be appended to the returned builder before building.
    pub fn builder(&self) -> MaskerSetBuilder {
        let mut builder = MaskerSetBuilder::new()
            .default_mask(self.default_mask.clone())
            .mask_paths(self.paths.iter().cloned());
        for rule in &self.path_masks {
            builder = match &rule.mask {
                Some(mask) => builder.mask_paths_with(rule.paths.iter().cloned(), mask.clone()),
                None => builder.mask_paths(rule.paths.iter().cloned()),
            };
        }
        builder = builder.mask_values(self.values.iter().cloned());
        for rule in &self.value_masks {
            builder = match &rule.mask {
                Some(mask) => builder.mask_values_with(rule.values.iter().cloned(), mask.clone()),
                None => builder.mask_values(rule.values.iter().cloned()),
            };
        }
        builder
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
