//! Serializing a view state into query parameters for server-side
//! filtering.

use gridview_model::ViewState;

/// `sortBy`, `sortDir` and `filters` (compact JSON, omitted when the tree
/// is empty) in that order.
pub fn to_query_pairs(view: &ViewState) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(3);
    if let Some(sort_by) = &view.sort_by {
        pairs.push(("sortBy".to_string(), sort_by.clone()));
        pairs.push(("sortDir".to_string(), view.sort_dir.as_str().to_string()));
    }
    if !view.filters_tree.is_empty() {
        match serde_json::to_string(&view.filters_tree) {
            Ok(json) => pairs.push(("filters".to_string(), json)),
            Err(error) => tracing::warn!(%error, "filter tree could not be serialized"),
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridview_model::{
        FilterGroup, FilterLeaf, FilterNode, FilterValue, LogicalOp, SortDirection,
    };

    #[test]
    fn empty_view_has_no_params() {
        assert!(to_query_pairs(&ViewState::default()).is_empty());
    }

    #[test]
    fn sort_and_filters() {
        let mut tree = FilterGroup::with_id("r", LogicalOp::And);
        tree.children.push(FilterNode::Leaf(FilterLeaf {
            id: "l".into(),
            field: "status".to_string(),
            operator: "=".to_string(),
            value: FilterValue::Text("paid".to_string()),
        }));
        let view = ViewState::default()
            .sorted_by("issuedAt", SortDirection::Desc)
            .with_filters(tree);
        let pairs = to_query_pairs(&view);
        assert_eq!(pairs[0], ("sortBy".to_string(), "issuedAt".to_string()));
        assert_eq!(pairs[1], ("sortDir".to_string(), "desc".to_string()));
        assert_eq!(
            pairs[2].1,
            r#"{"kind":"group","id":"r","logical":"AND","children":[{"kind":"leaf","id":"l","field":"status","operator":"=","value":"paid"}]}"#
        );
    }
}
