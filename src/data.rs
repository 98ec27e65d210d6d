use std::fmt;

use serde::{Deserialize, Serialize};

use crate::infer::ColumnType;

/// A single cell of a [`crate::dataset::Dataset`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Missing,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// Destination emptiness: missing, or text that is exactly `""`.
    ///
    /// Whitespace-only text is *not* empty here, so fill mode leaves it alone.
    pub fn is_empty_cell(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Source blankness: missing, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Converts a raw CSV field into a typed cell for a column of type `ty`.
///
/// Empty fields become [`Value::Missing`]. A field that does not parse as the
/// column type falls back to text rather than failing the load.
pub fn parse_typed_value(value: &str, ty: ColumnType) -> Value {
    if value.is_empty() {
        return Value::Missing;
    }
    match ty {
        ColumnType::Text => Value::Text(value.to_string()),
        ColumnType::Integer => value
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Text(value.to_string())),
        ColumnType::Float => value
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::Text(value.to_string())),
        ColumnType::Boolean => parse_boolean(value)
            .map(Value::Boolean)
            .unwrap_or_else(|| Value::Text(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_empty_predicates_differ_on_whitespace() {
        let spaces = Value::text("   ");
        assert!(spaces.is_blank());
        assert!(!spaces.is_empty_cell());
        assert!(Value::text("").is_empty_cell());
        assert!(Value::Missing.is_blank());
        assert!(!Value::Integer(0).is_blank());
        assert!(!Value::Boolean(false).is_empty_cell());
    }

    #[test]
    fn numeric_equality_crosses_integer_and_float() {
        assert_eq!(Value::Integer(3), Value::Float(3.0));
        assert_ne!(Value::Integer(3), Value::Float(3.5));
        assert_ne!(Value::text("3"), Value::Integer(3));
    }

    #[test]
    fn as_display_trims_whole_floats() {
        assert_eq!(Value::Float(12.0).as_display(), "12");
        assert_eq!(Value::Float(12.25).as_display(), "12.25");
        assert_eq!(Value::Missing.as_display(), "");
    }

    #[test]
    fn parse_typed_value_falls_back_to_text() {
        assert_eq!(parse_typed_value("", ColumnType::Integer), Value::Missing);
        assert_eq!(parse_typed_value("42", ColumnType::Integer), Value::Integer(42));
        assert_eq!(
            parse_typed_value("n/a", ColumnType::Float),
            Value::text("n/a")
        );
        assert_eq!(
            parse_typed_value("TRUE", ColumnType::Boolean),
            Value::Boolean(true)
        );
    }
}
