//! Applying a view state to an in-memory row set.

use gridview_model::{FieldRegistry, ViewState};
use serde_json::Value;

use crate::Row;
use crate::compare::sort_rows;
use crate::eval::matches;

/// Filter `rows` through the view's tree, then stable-sort them by the
/// view's sort column. Unregistered sort columns sort as text.
pub fn apply_view(view: &ViewState, rows: &[Row], registry: &FieldRegistry) -> Vec<Row> {
    let mut visible: Vec<Row> = rows
        .iter()
        .filter(|row| matches(&view.filters_tree, row, registry))
        .cloned()
        .collect();
    if let Some(sort_by) = &view.sort_by {
        sort_rows(
            &mut visible,
            sort_by,
            view.sort_dir,
            registry.field_type(sort_by),
        );
    }
    tracing::debug!(
        total = rows.len(),
        shown = visible.len(),
        sort_by = view.sort_by.as_deref().unwrap_or("-"),
        "applied view"
    );
    visible
}

/// Project rows onto the view's visible columns, in display order.
pub fn project_rows(view: &ViewState, rows: &[Row]) -> Vec<Vec<Value>> {
    let columns = view.visible_columns_in_order();
    rows.iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(*column).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridview_model::{FieldDef, FieldType, FilterLeaf, FilterNode, FilterValue, SortDirection};
    use serde_json::json;

    fn rows() -> Vec<Row> {
        [
            json!({"description": "Licence A", "balance": "100.00"}),
            json!({"description": "Licence B", "balance": "20.50"}),
            json!({"description": "Licence C", "balance": null}),
        ]
        .into_iter()
        .filter_map(|value| value.as_object().cloned())
        .collect()
    }

    fn registry() -> FieldRegistry {
        FieldRegistry::new(vec![FieldDef::new(
            "balance",
            "Balance",
            FieldType::Number,
            &["=", ">", "<"],
        )])
    }

    #[test]
    fn sorts_numeric_balances() {
        let view = ViewState::with_columns(["description", "balance"])
            .sorted_by("balance", SortDirection::Asc);
        let sorted = apply_view(&view, &rows(), &registry());
        let balances: Vec<Value> = sorted.iter().map(|row| row["balance"].clone()).collect();
        assert_eq!(balances, vec![json!(null), json!("20.50"), json!("100.00")]);
    }

    #[test]
    fn filters_before_sorting() {
        let mut view = ViewState::with_columns(["description", "balance"])
            .sorted_by("balance", SortDirection::Desc);
        view.filters_tree.children.push(FilterNode::Leaf(FilterLeaf {
            id: "f".into(),
            field: "balance".to_string(),
            operator: ">".to_string(),
            value: FilterValue::Number(10.0),
        }));
        let shown = apply_view(&view, &rows(), &registry());
        let names: Vec<Value> = shown.iter().map(|row| row["description"].clone()).collect();
        assert_eq!(names, vec![json!("Licence A"), json!("Licence B")]);
    }

    #[test]
    fn projection_follows_visible_order() {
        let mut view = ViewState::with_columns(["balance", "description"]);
        view.visible_columns.insert("balance".to_string(), false);
        let projected = project_rows(&view, &rows()[..1]);
        assert_eq!(projected, vec![vec![json!("Licence A")]]);
    }
}
