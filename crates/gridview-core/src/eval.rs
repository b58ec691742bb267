//! Client-side evaluation of a filter tree against a row.
//!
//! A leaf that cannot be evaluated yet (unknown field, unknown operator,
//! blank text operand) is ignored rather than treated as false, so a
//! half-built filter never hides every row. Empty groups match everything.

use std::cmp::Ordering;

use gridview_model::{FieldRegistry, FieldType, FilterGroup, FilterLeaf, FilterNode, LogicalOp};
use serde_json::Value;
use tracing::trace;

use crate::Row;
use crate::compare::{SortKey, compare_keys, parse_number};

/// Operator tokens understood by [`matches`].
pub const OPERATORS: &[&str] = &[
    "=",
    "!=",
    ">",
    "<",
    ">=",
    "<=",
    "contains",
    "startsWith",
    "endsWith",
    "isEmpty",
    "isNotEmpty",
];

/// Does `row` satisfy the filter tree?
pub fn matches(tree: &FilterGroup, row: &Row, registry: &FieldRegistry) -> bool {
    let mut results = tree
        .children
        .iter()
        .filter_map(|child| evaluate(child, row, registry));
    match tree.logical {
        LogicalOp::And => results.all(|matched| matched),
        // An OR group whose children are all ignored behaves like an empty group.
        LogicalOp::Or => {
            let mut any_evaluated = false;
            for matched in results {
                if matched {
                    return true;
                }
                any_evaluated = true;
            }
            !any_evaluated
        }
    }
}

/// `None` when the node is ignored.
fn evaluate(node: &FilterNode, row: &Row, registry: &FieldRegistry) -> Option<bool> {
    match node {
        FilterNode::Group(group) if group.is_empty() => None,
        FilterNode::Group(group) => Some(matches(group, row, registry)),
        FilterNode::Leaf(leaf) => evaluate_leaf(leaf, row, registry),
    }
}

fn evaluate_leaf(leaf: &FilterLeaf, row: &Row, registry: &FieldRegistry) -> Option<bool> {
    let Some(field) = registry.get(&leaf.field) else {
        trace!(field = %leaf.field, "leaf ignored: field not in registry");
        return None;
    };
    let cell = row.get(&leaf.field);
    let operand = leaf.value.to_json();

    let result = match leaf.operator.as_str() {
        "isEmpty" => is_empty_cell(cell),
        "isNotEmpty" => !is_empty_cell(cell),
        "contains" | "startsWith" | "endsWith" => {
            if leaf.value.is_blank() {
                return None;
            }
            let haystack = cell_text(cell)?.to_lowercase();
            let needle = value_text(&operand).to_lowercase();
            match leaf.operator.as_str() {
                "contains" => haystack.contains(&needle),
                "startsWith" => haystack.starts_with(&needle),
                _ => haystack.ends_with(&needle),
            }
        }
        "=" | "!=" | ">" | "<" | ">=" | "<=" => {
            let textual = matches!(field.field_type, FieldType::String | FieldType::Date);
            if textual && leaf.value.is_blank() {
                return None;
            }
            let ordering = compare_cell(cell, &operand, field.field_type);
            match (leaf.operator.as_str(), ordering) {
                ("=", ordering) => ordering == Some(Ordering::Equal),
                ("!=", ordering) => ordering != Some(Ordering::Equal),
                (_, None) => false,
                (">", Some(ordering)) => ordering == Ordering::Greater,
                ("<", Some(ordering)) => ordering == Ordering::Less,
                (">=", Some(ordering)) => ordering != Ordering::Less,
                (_, Some(ordering)) => ordering != Ordering::Greater,
            }
        }
        other => {
            trace!(operator = other, "leaf ignored: unknown operator");
            return None;
        }
    };
    Some(result)
}

/// Ordering of a cell relative to the operand; `None` when either side is
/// missing, which makes every relational operator except `!=` fail.
fn compare_cell(cell: Option<&Value>, operand: &Value, field_type: FieldType) -> Option<Ordering> {
    let left = key_for(cell, field_type);
    let right = key_for(Some(operand), field_type);
    if left == SortKey::Missing || right == SortKey::Missing {
        return None;
    }
    Some(match (&left, &right) {
        (SortKey::Text(a), SortKey::Text(b)) => {
            let a = a.to_lowercase();
            let b = b.to_lowercase();
            a.cmp(&b)
        }
        _ => compare_keys(&left, &right),
    })
}

fn key_for(value: Option<&Value>, field_type: FieldType) -> SortKey {
    match field_type {
        FieldType::Boolean => match value {
            Some(Value::Bool(flag)) => SortKey::Text(flag.to_string()),
            Some(Value::String(text)) => match text.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => SortKey::Text("true".to_string()),
                "false" | "no" | "0" => SortKey::Text("false".to_string()),
                _ => SortKey::Missing,
            },
            Some(number @ Value::Number(_)) => match parse_number(number) {
                Some(n) if n == 0.0 => SortKey::Text("false".to_string()),
                Some(_) => SortKey::Text("true".to_string()),
                None => SortKey::Missing,
            },
            _ => SortKey::Missing,
        },
        _ => SortKey::from_value(value, field_type),
    }
}

fn is_empty_cell(cell: Option<&Value>) -> bool {
    match cell {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn cell_text(cell: Option<&Value>) -> Option<String> {
    match cell? {
        Value::Null => None,
        value => Some(value_text(value)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridview_model::{FieldDef, FilterValue, NodeId};
    use serde_json::json;

    fn registry() -> FieldRegistry {
        FieldRegistry::new(vec![
            FieldDef::new("balance", "Balance", FieldType::Number, &["=", ">", "<", ">=", "<="]),
            FieldDef::new("description", "Description", FieldType::String, &["contains", "="]),
            FieldDef::new("active", "Active", FieldType::Boolean, &["="]),
            FieldDef::new("due", "Due", FieldType::Date, &["<", "isEmpty"]),
        ])
    }

    fn leaf(field: &str, operator: &str, value: FilterValue) -> FilterNode {
        FilterNode::Leaf(FilterLeaf {
            id: NodeId::generate(),
            field: field.to_string(),
            operator: operator.to_string(),
            value,
        })
    }

    fn group(logical: LogicalOp, children: Vec<FilterNode>) -> FilterGroup {
        FilterGroup {
            id: NodeId::generate(),
            logical,
            children,
        }
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_tree_matches_everything() {
        let tree = group(LogicalOp::And, vec![]);
        assert!(matches(&tree, &row(json!({})), &registry()));
    }

    #[test]
    fn numeric_comparison_on_string_cells() {
        let tree = group(
            LogicalOp::And,
            vec![leaf("balance", ">", FilterValue::Number(50.0))],
        );
        let registry = registry();
        assert!(matches(&tree, &row(json!({"balance": "100.00"})), &registry));
        assert!(!matches(&tree, &row(json!({"balance": "20.50"})), &registry));
        assert!(!matches(&tree, &row(json!({"balance": null})), &registry));
    }

    #[test]
    fn and_or_combination() {
        let registry = registry();
        let tree = group(
            LogicalOp::Or,
            vec![
                leaf("description", "contains", FilterValue::Text("ACME".to_string())),
                FilterNode::Group(group(
                    LogicalOp::And,
                    vec![
                        leaf("balance", ">=", FilterValue::Number(10.0)),
                        leaf("active", "=", FilterValue::Bool(true)),
                    ],
                )),
            ],
        );
        assert!(matches(&tree, &row(json!({"description": "Acme Corp"})), &registry));
        assert!(matches(
            &tree,
            &row(json!({"description": "Other", "balance": 10, "active": "yes"})),
            &registry
        ));
        assert!(!matches(
            &tree,
            &row(json!({"description": "Other", "balance": 10, "active": false})),
            &registry
        ));
    }

    #[test]
    fn incomplete_leaves_are_ignored() {
        let registry = registry();
        let tree = group(
            LogicalOp::And,
            vec![
                leaf("description", "contains", FilterValue::Text(String::new())),
                leaf("ghost", "=", FilterValue::Number(1.0)),
                leaf("balance", "~", FilterValue::Number(1.0)),
            ],
        );
        assert!(matches(&tree, &row(json!({"balance": 5})), &registry));

        let or_tree = group(
            LogicalOp::Or,
            vec![leaf("description", "contains", FilterValue::Text(String::new()))],
        );
        assert!(matches(&or_tree, &row(json!({})), &registry));
    }

    #[test]
    fn emptiness_operators() {
        let registry = registry();
        let tree = group(LogicalOp::And, vec![leaf("due", "isEmpty", FilterValue::Null)]);
        assert!(matches(&tree, &row(json!({"due": ""})), &registry));
        assert!(!matches(&tree, &row(json!({"due": "2024-05-01"})), &registry));
    }

    #[test]
    fn dates_compare_as_iso_text() {
        let registry = registry();
        let tree = group(
            LogicalOp::And,
            vec![leaf("due", "<", FilterValue::Text("2024-06-01".to_string()))],
        );
        assert!(matches(&tree, &row(json!({"due": "2024-05-01"})), &registry));
        assert!(!matches(&tree, &row(json!({"due": "2024-07-01"})), &registry));
    }
}
