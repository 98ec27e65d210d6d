//! Destination/source column mapping.
//!
//! A mapping pairs a primary (destination) column with a secondary (source)
//! column. Explicit mappings are validated pair by pair; invalid pairs are
//! dropped and counted instead of failing the whole mapping. Without an
//! explicit mapping the identity mapping over shared non-key columns is used.
//!
//! Interchange JSON is either an object `{"dest": "src", ...}` or a list
//! `[{"dest": "..", "src": ".."}, ...]`; exports always use the list form.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result as AnyResult};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ReconcileError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingPair {
    pub dest: String,
    pub src: String,
}

impl MappingPair {
    pub fn new(dest: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            dest: dest.into(),
            src: src.into(),
        }
    }
}

/// Caller-supplied mapping, not yet validated against any dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    pairs: Vec<MappingPair>,
}

impl FieldMapping {
    pub fn new(pairs: Vec<MappingPair>) -> Self {
        Self { pairs }
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(dest, src)| MappingPair::new(dest, src))
                .collect(),
        )
    }

    pub fn pairs(&self) -> &[MappingPair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Parses mapping interchange JSON.
    ///
    /// List entries that are not `{dest, src}` string objects are skipped and
    /// counted in [`ParsedMapping::malformed`]; any other top-level shape is a
    /// format error.
    pub fn from_json_str(payload: &str) -> Result<ParsedMapping> {
        let value: JsonValue = serde_json::from_str(payload)
            .map_err(|err| ReconcileError::format(format!("invalid mapping JSON: {err}")))?;
        match value {
            JsonValue::Object(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                let mut malformed = 0usize;
                for (dest, src) in entries {
                    match src {
                        JsonValue::String(src) => pairs.push(MappingPair::new(dest, src)),
                        _ => malformed += 1,
                    }
                }
                Ok(ParsedMapping {
                    mapping: FieldMapping::new(pairs),
                    malformed,
                })
            }
            JsonValue::Array(items) => {
                let mut pairs = Vec::with_capacity(items.len());
                let mut malformed = 0usize;
                for item in items {
                    match serde_json::from_value::<MappingPair>(item) {
                        Ok(pair) => pairs.push(pair),
                        Err(_) => malformed += 1,
                    }
                }
                Ok(ParsedMapping {
                    mapping: FieldMapping::new(pairs),
                    malformed,
                })
            }
            other => Err(ReconcileError::format(format!(
                "mapping JSON must be an object or a list of {{\"dest\", \"src\"}} objects, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMapping {
    pub mapping: FieldMapping,
    pub malformed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingOrigin {
    /// Identity over shared non-key columns.
    Default,
    Explicit,
}

/// Mapping validated against concrete column sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    pairs: Vec<MappingPair>,
    dropped: usize,
    origin: MappingOrigin,
}

impl ResolvedMapping {
    pub fn pairs(&self) -> &[MappingPair] {
        &self.pairs
    }

    /// Explicit pairs rejected during validation.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn origin(&self) -> MappingOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_field_mapping(&self) -> FieldMapping {
        FieldMapping::new(self.pairs.clone())
    }

    /// Canonical list-of-pairs JSON in resolved order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.pairs)
            .map_err(|err| ReconcileError::format(format!("serializing mapping: {err}")))
    }
}

/// Resolves the mapping used by a merge.
///
/// With `explicit`, destinations must be non-key primary columns and sources
/// non-key secondary columns; other pairs are dropped. A destination listed
/// twice keeps its first position and its last source. Without `explicit`,
/// every non-key primary column that also exists in the secondary maps to
/// itself, in primary column order.
pub fn resolve_mapping(
    explicit: Option<&FieldMapping>,
    primary_columns: &[String],
    secondary_columns: &[String],
    key_columns: &[String],
) -> ResolvedMapping {
    let is_key = |name: &str| key_columns.iter().any(|k| k == name);
    let Some(explicit) = explicit else {
        let pairs = primary_columns
            .iter()
            .filter(|name| !is_key(name) && secondary_columns.contains(name))
            .map(|name| MappingPair::new(name.as_str(), name.as_str()))
            .collect();
        return ResolvedMapping {
            pairs,
            dropped: 0,
            origin: MappingOrigin::Default,
        };
    };

    let mut merged: Vec<MappingPair> = Vec::with_capacity(explicit.pairs.len());
    let mut slot_by_dest: HashMap<&str, usize> = HashMap::new();
    for pair in &explicit.pairs {
        match slot_by_dest.get(pair.dest.as_str()) {
            Some(&slot) => merged[slot].src = pair.src.clone(),
            None => {
                slot_by_dest.insert(pair.dest.as_str(), merged.len());
                merged.push(pair.clone());
            }
        }
    }

    let mut pairs = Vec::with_capacity(merged.len());
    let mut dropped = 0usize;
    for pair in merged {
        let dest_ok = !is_key(&pair.dest) && primary_columns.contains(&pair.dest);
        let src_ok = !is_key(&pair.src) && secondary_columns.contains(&pair.src);
        if dest_ok && src_ok {
            pairs.push(pair);
        } else {
            warn!(
                "Dropping mapping pair '{}' <- '{}': {}",
                pair.dest,
                pair.src,
                match (dest_ok, src_ok) {
                    (false, false) => "destination and source are not mappable columns",
                    (false, true) => "destination is not a non-key primary column",
                    _ => "source is not a non-key secondary column",
                }
            );
            dropped += 1;
        }
    }
    ResolvedMapping {
        pairs,
        dropped,
        origin: MappingOrigin::Explicit,
    }
}

/// Outcome of importing mapping JSON against concrete column sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingImport {
    pub mapping: ResolvedMapping,
    /// Malformed entries plus pairs rejected by validation.
    pub dropped: usize,
}

impl MappingImport {
    pub fn accepted(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_success(&self) -> bool {
        !self.mapping.is_empty()
    }
}

pub fn import_mapping(
    payload: &str,
    primary_columns: &[String],
    secondary_columns: &[String],
    key_columns: &[String],
) -> Result<MappingImport> {
    let parsed = FieldMapping::from_json_str(payload)?;
    let mapping = resolve_mapping(
        Some(&parsed.mapping),
        primary_columns,
        secondary_columns,
        key_columns,
    );
    let dropped = parsed.malformed + mapping.dropped();
    Ok(MappingImport { mapping, dropped })
}

pub fn load_mapping(path: &Path) -> AnyResult<ParsedMapping> {
    let raw = fs::read_to_string(path).with_context(|| format!("Reading mapping file {path:?}"))?;
    let parsed =
        FieldMapping::from_json_str(&raw).with_context(|| format!("Parsing mapping file {path:?}"))?;
    if parsed.malformed > 0 {
        warn!(
            "Skipped {} malformed entr(y/ies) in mapping file {:?}",
            parsed.malformed, path
        );
    }
    Ok(parsed)
}

pub fn save_mapping(path: &Path, mapping: &ResolvedMapping) -> AnyResult<()> {
    let json = mapping.to_json()?;
    fs::write(path, json).with_context(|| format!("Writing mapping file {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn default_mapping_is_identity_over_shared_non_key_columns() {
        let mapping = resolve_mapping(
            None,
            &cols(&["id", "name", "city", "note"]),
            &cols(&["city", "id", "name", "phone"]),
            &cols(&["id"]),
        );
        assert_eq!(
            mapping.pairs(),
            &[MappingPair::new("name", "name"), MappingPair::new("city", "city")]
        );
        assert_eq!(mapping.origin(), MappingOrigin::Default);
    }

    #[test]
    fn explicit_mapping_drops_key_and_unknown_columns() {
        let explicit = FieldMapping::from_pairs([
            ("Ho va ten", "ho ten"),
            ("id", "ho ten"),
            ("city", "missing"),
            ("city", "id"),
        ]);
        let mapping = resolve_mapping(
            Some(&explicit),
            &cols(&["id", "Ho va ten", "city"]),
            &cols(&["id", "ho ten"]),
            &cols(&["id"]),
        );
        assert_eq!(mapping.pairs(), &[MappingPair::new("Ho va ten", "ho ten")]);
        // "city" collapses to one pair (last source wins) before validation.
        assert_eq!(mapping.dropped(), 2);
    }

    #[test]
    fn repeated_destination_keeps_first_position_and_last_source() {
        let explicit = FieldMapping::from_pairs([("a", "x"), ("b", "y"), ("a", "z")]);
        let mapping = resolve_mapping(
            Some(&explicit),
            &cols(&["a", "b"]),
            &cols(&["x", "y", "z"]),
            &[],
        );
        assert_eq!(
            mapping.pairs(),
            &[MappingPair::new("a", "z"), MappingPair::new("b", "y")]
        );
    }

    #[test]
    fn object_payload_preserves_document_order() {
        let parsed = FieldMapping::from_json_str(r#"{"zeta": "z", "alpha": "a"}"#).unwrap();
        assert_eq!(
            parsed.mapping.pairs(),
            &[MappingPair::new("zeta", "z"), MappingPair::new("alpha", "a")]
        );
    }

    #[test]
    fn list_payload_skips_malformed_entries() {
        let parsed = FieldMapping::from_json_str(
            r#"[{"dest": "a", "src": "b"}, {"dest": "c"}, 5, {"dest": "d", "src": "e", "note": 1}]"#,
        )
        .unwrap();
        assert_eq!(
            parsed.mapping.pairs(),
            &[MappingPair::new("a", "b"), MappingPair::new("d", "e")]
        );
        assert_eq!(parsed.malformed, 2);
    }

    #[test]
    fn scalar_payload_is_a_format_error() {
        for payload in ["42", "\"name\"", "null", "not json"] {
            let err = FieldMapping::from_json_str(payload).unwrap_err();
            assert!(matches!(err, ReconcileError::Format(_)), "{payload}");
        }
    }
}
