//! Per-column type inference for CSV text.
//!
//! A column becomes [`ColumnType::Integer`], [`ColumnType::Float`] or
//! [`ColumnType::Boolean`] only when every non-empty, non-placeholder field
//! parses as that type *and* prints back to exactly the same text; anything
//! else stays [`ColumnType::Text`]. Typed cells therefore always write out as
//! the field they were read from (`1.50`, `TRUE`, `+5`, `007` and integers
//! beyond `i64` stay text). Typing matters for key normalization, which trims
//! and lowercases text cells only.

use serde::{Deserialize, Serialize};

use crate::data::{Value, parse_typed_value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Integer,
    Float,
    Boolean,
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    non_empty: usize,
    possible_integer: bool,
    possible_float: bool,
    possible_boolean: bool,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            non_empty: 0,
            possible_integer: true,
            possible_float: true,
            possible_boolean: true,
        }
    }

    fn update(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        self.non_empty += 1;
        if self.possible_integer && !round_trips(value, ColumnType::Integer) {
            self.possible_integer = false;
        }
        if self.possible_float
            && !(is_plain_float(value) && round_trips(value, ColumnType::Float))
        {
            self.possible_float = false;
        }
        if self.possible_boolean && !round_trips(value, ColumnType::Boolean) {
            self.possible_boolean = false;
        }
    }

    fn decide(&self) -> ColumnType {
        if self.non_empty == 0 {
            ColumnType::Text
        } else if self.possible_boolean {
            ColumnType::Boolean
        } else if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_float {
            ColumnType::Float
        } else {
            ColumnType::Text
        }
    }
}

// Typed only if parsing is lossless: the cell prints back as `value`.
fn round_trips(value: &str, ty: ColumnType) -> bool {
    let parsed = parse_typed_value(value, ty);
    let typed = match ty {
        ColumnType::Integer => matches!(parsed, Value::Integer(_)),
        ColumnType::Float => matches!(parsed, Value::Float(_)),
        ColumnType::Boolean => matches!(parsed, Value::Boolean(_)),
        ColumnType::Text => true,
    };
    typed && parsed.as_display() == value
}

// Rejects "inf", "NaN" and friends, which `f64::from_str` accepts.
fn is_plain_float(value: &str) -> bool {
    value.parse::<f64>().is_ok()
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

/// Tokens loaded as missing cells, mirroring common spreadsheet NA markers.
pub fn is_placeholder_token(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    matches!(
        lowered.as_str(),
        "na" | "n/a" | "#n/a" | "null" | "nan" | "-nan" | "none" | "<na>"
    )
}

/// Infers one [`ColumnType`] per column from decoded rows.
///
/// `rows` may be ragged; missing trailing fields count as empty.
pub fn infer_column_types(column_count: usize, rows: &[Vec<String>]) -> Vec<ColumnType> {
    let mut candidates = vec![TypeCandidate::new(); column_count];
    for row in rows {
        for (idx, field) in row.iter().enumerate().take(column_count) {
            if is_placeholder_token(field) {
                continue;
            }
            candidates[idx].update(field);
        }
    }
    candidates.iter().map(TypeCandidate::decide).collect()
}
