//! Type-aware ordering for tabular sort.
//!
//! Precedence:
//! 1. both values missing → equal
//! 2. one missing → it sorts first ascending, last descending
//! 3. numeric fields (numbers or numeric strings such as `"100.00"`) compare
//!    as `f64`; unparseable values count as missing
//! 4. everything else compares as text, case-insensitively first
//! 5. descending reverses the result
//!
//! [`sort_rows`] is stable, so equal keys keep their previous order.

use std::cmp::Ordering;

use gridview_model::{FieldType, SortDirection};
use serde_json::Value;

use crate::Row;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortKey {
    Missing,
    Number(f64),
    Text(String),
}

impl SortKey {
    pub(crate) fn from_value(value: Option<&Value>, field_type: FieldType) -> Self {
        let Some(value) = value else {
            return Self::Missing;
        };
        if field_type.is_numeric() {
            return parse_number(value).map_or(Self::Missing, Self::Number);
        }
        match value {
            Value::Null => Self::Missing,
            Value::String(text) => Self::Text(text.clone()),
            Value::Bool(flag) => Self::Text(flag.to_string()),
            Value::Number(number) => Self::Text(number.to_string()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Coerce a cell to a finite number.
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Compare two cell values.
pub fn compare_values(
    a: Option<&Value>,
    b: Option<&Value>,
    direction: SortDirection,
    field_type: FieldType,
) -> Ordering {
    let ascending = compare_keys(
        &SortKey::from_value(a, field_type),
        &SortKey::from_value(b, field_type),
    );
    match direction {
        SortDirection::Asc => ascending,
        SortDirection::Desc => ascending.reverse(),
    }
}

/// Compare two rows by `field`.
pub fn compare_rows(
    a: &Row,
    b: &Row,
    field: &str,
    direction: SortDirection,
    field_type: FieldType,
) -> Ordering {
    compare_values(a.get(field), b.get(field), direction, field_type)
}

/// Stable in-place sort of rows by `field`.
pub fn sort_rows(rows: &mut [Row], field: &str, direction: SortDirection, field_type: FieldType) {
    rows.sort_by(|a, b| compare_rows(a, b, field, direction, field_type));
}

pub(crate) fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
        (SortKey::Missing, _) => Ordering::Less,
        (_, SortKey::Missing) => Ordering::Greater,
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => compare_text(x, y),
        // Mixed keys only arise from hand-built rows; numbers first.
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
    }
}

/// Case-insensitive comparison; strings equal ignoring case put lowercase
/// before uppercase.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}
