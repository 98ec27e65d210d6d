//! Composite join keys.
//!
//! Each key column contributes one segment. Text cells are trimmed and
//! lowercased; other cells are stringified as-is. Present segments are written
//! as `<byte-length>:<text>` and missing cells as `~`, so the concatenation is
//! injective: a `|` or any other character inside a field can never make two
//! different tuples collide.

use std::fmt::{self, Write as _};

use itertools::Itertools;

use crate::{
    data::Value,
    dataset::Dataset,
    error::{ReconcileError, Result},
};

const MISSING_SEGMENT: &str = "~";

/// Canonical key identifying one entity across both datasets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key columns resolved to positions in both datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumns {
    names: Vec<String>,
    primary: Vec<usize>,
    secondary: Vec<usize>,
}

impl KeyColumns {
    /// Resolves `names` against both datasets.
    ///
    /// Fails when the selection is empty or any name is absent from either side.
    pub fn resolve(names: &[String], primary: &Dataset, secondary: &Dataset) -> Result<Self> {
        if names.is_empty() {
            return Err(ReconcileError::configuration(
                "at least one key column must be selected",
            ));
        }
        let missing_primary = names
            .iter()
            .filter(|name| !primary.has_column(name))
            .collect::<Vec<_>>();
        let missing_secondary = names
            .iter()
            .filter(|name| !secondary.has_column(name))
            .collect::<Vec<_>>();
        if !missing_primary.is_empty() || !missing_secondary.is_empty() {
            let mut message = String::from("key column(s) not present in both datasets");
            if !missing_primary.is_empty() {
                let _ = write!(
                    message,
                    "; missing from primary: {}",
                    missing_primary.iter().join(", ")
                );
            }
            if !missing_secondary.is_empty() {
                let _ = write!(
                    message,
                    "; missing from secondary: {}",
                    missing_secondary.iter().join(", ")
                );
            }
            return Err(ReconcileError::Configuration(message));
        }

        let positions = |dataset: &Dataset| {
            names
                .iter()
                .filter_map(|name| dataset.column_index(name))
                .collect::<Vec<_>>()
        };
        Ok(Self {
            names: names.to_vec(),
            primary: positions(primary),
            secondary: positions(secondary),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn primary_indices(&self) -> &[usize] {
        &self.primary
    }

    pub fn secondary_indices(&self) -> &[usize] {
        &self.secondary
    }
}

/// String form of one key cell; `None` for a missing cell.
pub fn normalize_value(value: &Value) -> Option<String> {
    match value {
        Value::Missing => None,
        Value::Text(s) => Some(s.trim().to_lowercase()),
        other => Some(other.as_display()),
    }
}

pub fn build_key(record: &[Value], indices: &[usize]) -> NormalizedKey {
    let mut encoded = String::new();
    for idx in indices {
        match record.get(*idx).and_then(normalize_value) {
            Some(segment) => {
                let _ = write!(encoded, "{}:{}", segment.len(), segment);
            }
            None => encoded.push_str(MISSING_SEGMENT),
        }
    }
    NormalizedKey(encoded)
}

/// Normalized keys for every record of `dataset`, in row order.
pub fn normalize(dataset: &Dataset, indices: &[usize]) -> Vec<NormalizedKey> {
    dataset
        .rows()
        .iter()
        .map(|record| build_key(record, indices))
        .collect()
}

/// Name-based variant of [`normalize`] for callers holding a single dataset.
pub fn normalize_by_name(
    dataset: &Dataset,
    key_columns: &[String],
) -> Result<Vec<NormalizedKey>> {
    if key_columns.is_empty() {
        return Err(ReconcileError::configuration(
            "at least one key column must be selected",
        ));
    }
    let indices = key_columns
        .iter()
        .map(|name| {
            dataset.column_index(name).ok_or_else(|| {
                ReconcileError::configuration(format!("key column '{name}' not found"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(normalize(dataset, &indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_segments_are_trimmed_and_lowercased() {
        let a = build_key(&[Value::text("  Hanoi "), Value::Integer(1)], &[0, 1]);
        let b = build_key(&[Value::text("hANOI"), Value::Integer(1)], &[0, 1]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "5:hanoi1:1");
    }

    #[test]
    fn pipe_inside_fields_does_not_collide() {
        let a = build_key(&[Value::text("a|b"), Value::text("c")], &[0, 1]);
        let b = build_key(&[Value::text("a"), Value::text("b|c")], &[0, 1]);
        assert_ne!(a, b);
    }

    #[test]
    fn missing_differs_from_empty_text() {
        let missing = build_key(&[Value::Missing], &[0]);
        let empty = build_key(&[Value::text("")], &[0]);
        assert_ne!(missing, empty);
        assert_eq!(missing, build_key(&[Value::Missing], &[0]));
    }

    #[test]
    fn normalize_by_name_follows_key_column_order() {
        let dataset = Dataset::new(
            vec!["city".into(), "id".into()],
            vec![vec![Value::text(" Hue"), Value::Integer(4)]],
        )
        .unwrap();
        let keys = normalize_by_name(&dataset, &["id".to_string(), "city".to_string()]).unwrap();
        assert_eq!(keys[0].as_str(), "1:43:hue");

        let err = normalize_by_name(&dataset, &["branch".to_string()]).unwrap_err();
        assert!(matches!(err, ReconcileError::Configuration(_)));
        assert!(normalize_by_name(&dataset, &[]).is_err());
    }

    #[test]
    fn numbers_are_not_lowercased_or_retyped() {
        assert_eq!(normalize_value(&Value::Float(2.0)).as_deref(), Some("2"));
        assert_eq!(normalize_value(&Value::Boolean(true)).as_deref(), Some("true"));
    }
}
