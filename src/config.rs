//! YAML reconcile profiles.
//!
//! A profile stores the static part of a merge configuration so repeated runs
//! over refreshed exports do not need the full command line:
//!
//! ```yaml
//! key_columns: [id]
//! mode: prefer-secondary
//! add_missing_rows: true
//! mapping:
//!   - dest: Ho va ten
//!     src: ho ten
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    mapping::{FieldMapping, MappingPair, ParsedMapping},
    merge::{MergeMode, ReconcileConfig},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileProfile {
    #[serde(default)]
    pub key_columns: Vec<String>,
    #[serde(default)]
    pub mode: Option<MergeMode>,
    #[serde(default)]
    pub add_missing_rows: Option<bool>,
    #[serde(default)]
    pub allow_empty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Vec<MappingPair>>,
}

/// Values given on the command line; each one that is set wins over the profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileOverrides {
    pub key_columns: Vec<String>,
    pub mode: Option<MergeMode>,
    pub add_missing_rows: Option<bool>,
    pub allow_empty: Option<bool>,
    pub mapping: Option<ParsedMapping>,
}

impl ReconcileProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Reading profile {path:?}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Parsing profile {path:?}"))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_yaml::to_string(self).context("Serializing profile")?;
        fs::write(path, serialized).with_context(|| format!("Writing profile {path:?}"))
    }

    /// Captures the static part of an effective configuration.
    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self {
            key_columns: config.key_columns.clone(),
            mode: Some(config.mode),
            add_missing_rows: Some(config.add_missing_rows),
            allow_empty: Some(config.allow_empty),
            mapping: config
                .mapping
                .as_ref()
                .map(|mapping| mapping.pairs().to_vec()),
        }
    }

    /// Combines the profile with command-line overrides.
    pub fn into_config(self, overrides: ProfileOverrides) -> Result<ReconcileConfig> {
        let key_columns = if overrides.key_columns.is_empty() {
            self.key_columns
        } else {
            overrides.key_columns
        };
        if key_columns.is_empty() {
            return Err(anyhow!(
                "No key columns given; pass --key or set key_columns in the profile"
            ));
        }
        let mut config = ReconcileConfig::new(key_columns)
            .with_mode(overrides.mode.or(self.mode).unwrap_or_default())
            .with_add_missing_rows(
                overrides
                    .add_missing_rows
                    .or(self.add_missing_rows)
                    .unwrap_or(true),
            )
            .with_allow_empty(overrides.allow_empty.or(self.allow_empty).unwrap_or(false));
        if let Some(parsed) = overrides.mapping {
            config = config.with_parsed_mapping(parsed);
        } else if let Some(pairs) = self.mapping {
            config = config.with_mapping(FieldMapping::new(pairs));
        }
        Ok(config)
    }
}
