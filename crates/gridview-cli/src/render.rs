//! Terminal rendering of rows, column state and filter trees.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use gridview_core::Row;
use gridview_model::{FieldRegistry, FilterGroup, FilterNode, ViewState};
use serde_json::Value;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// Rows restricted to the visible columns, in display order.
pub fn rows_table(view: &ViewState, rows: &[Row], registry: &FieldRegistry) -> Table {
    let columns = view.visible_columns_in_order();
    let mut table = Table::new();
    table.set_header(
        columns
            .iter()
            .map(|column| header_cell(column, view, registry))
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut table);
    for (index, column) in columns.iter().enumerate() {
        let numeric = registry
            .get(column)
            .is_some_and(|field| field.field_type.is_numeric());
        if numeric && let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    for row in rows {
        table.add_row(
            columns
                .iter()
                .map(|column| value_cell(row.get(*column)))
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Every known column with its position, visibility and sort marker.
pub fn columns_table(view: &ViewState, registry: &FieldRegistry) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        plain_header("#"),
        plain_header("Column"),
        plain_header("Label"),
        plain_header("Visible"),
        plain_header("Sort"),
    ]);
    apply_table_style(&mut table);
    for (index, column) in view.columns_order.iter().enumerate() {
        let label = registry
            .get(column)
            .map_or_else(String::new, |field| field.display_label().to_string());
        let visible = if view.is_visible(column) {
            Cell::new("yes").fg(Color::Green)
        } else {
            dim_cell("no")
        };
        let sort = if view.sort_by.as_deref() == Some(column.as_str()) {
            Cell::new(view.sort_dir.as_str()).fg(Color::Cyan)
        } else {
            dim_cell("-")
        };
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(column),
            Cell::new(label),
            visible,
            sort,
        ]);
    }
    table
}

/// Indented outline of a filter tree with node ids.
pub fn render_tree(tree: &FilterGroup) -> String {
    let mut out = String::new();
    write_group(&mut out, tree, 0);
    out
}

fn write_group(out: &mut String, group: &FilterGroup, depth: usize) {
    let suffix = if group.is_empty() { " (empty)" } else { "" };
    out.push_str(&format!(
        "{}{}{}  [{}]\n",
        "  ".repeat(depth),
        group.logical.as_str(),
        suffix,
        group.id
    ));
    for child in &group.children {
        match child {
            FilterNode::Group(inner) => write_group(out, inner, depth + 1),
            FilterNode::Leaf(leaf) => out.push_str(&format!(
                "{}{} {} {}  [{}]\n",
                "  ".repeat(depth + 1),
                leaf.field,
                leaf.operator,
                leaf.value,
                leaf.id
            )),
        }
    }
}

/// Display text of a cell.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn header_cell(column: &str, view: &ViewState, registry: &FieldRegistry) -> Cell {
    let label = registry
        .get(column)
        .map_or(column, |field| field.display_label());
    let marker = match (&view.sort_by, view.sort_dir.is_desc()) {
        (Some(sort_by), false) if sort_by == column => " ▲",
        (Some(sort_by), true) if sort_by == column => " ▼",
        _ => "",
    };
    plain_header(&format!("{label}{marker}"))
}

fn plain_header(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn value_cell(value: Option<&Value>) -> Cell {
    match value {
        None | Some(Value::Null) => dim_cell("-"),
        other => Cell::new(cell_text(other)),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridview_model::{FieldDef, FieldType, FilterLeaf, FilterValue, LogicalOp, SortDirection};
    use serde_json::json;

    #[test]
    fn tree_outline() {
        let tree = FilterGroup {
            id: "root".into(),
            logical: LogicalOp::And,
            children: vec![
                FilterNode::Leaf(FilterLeaf {
                    id: "l1".into(),
                    field: "balance".to_string(),
                    operator: ">".to_string(),
                    value: FilterValue::Number(10.0),
                }),
                FilterNode::Group(FilterGroup::with_id("g1", LogicalOp::Or)),
            ],
        };
        insta::assert_snapshot!(render_tree(&tree), @r"
        AND  [root]
          balance > 10  [l1]
          OR (empty)  [g1]
        ");
    }

    #[test]
    fn rows_table_shows_visible_columns_in_order() {
        let registry = FieldRegistry::new(vec![FieldDef::new(
            "balance",
            "Balance",
            FieldType::Number,
            &["="],
        )]);
        let mut view = ViewState::with_columns(["description", "balance", "status"])
            .sorted_by("balance", SortDirection::Desc);
        view.columns_order = vec![
            "balance".to_string(),
            "description".to_string(),
            "status".to_string(),
        ];
        view.visible_columns.insert("status".to_string(), false);
        let rows = vec![json!({"description": "Acme", "balance": "100.00", "status": "open"})
            .as_object()
            .cloned()
            .unwrap()];

        let rendered = rows_table(&view, &rows, &registry).to_string();
        let header = rendered.lines().nth(1).unwrap();
        assert!(header.find("Balance ▼").unwrap() < header.find("description").unwrap());
        assert!(!rendered.contains("status"));
        assert!(!rendered.contains("open"));
        assert!(rendered.contains("100.00"));
    }

    #[test]
    fn missing_cells_render_blank() {
        assert_eq!(cell_text(None), "");
        assert_eq!(cell_text(Some(&json!(null))), "");
        assert_eq!(cell_text(Some(&json!(12.5))), "12.5");
        assert_eq!(cell_text(Some(&json!("x"))), "x");
    }
}
