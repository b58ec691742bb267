//! Filter tree mutation engine.
//!
//! Every operation takes the current tree by reference and returns the next
//! tree; the input is never modified. Nodes are addressed only by id. Only
//! the path from the root to the edited node is rebuilt; an operation whose
//! target cannot be resolved returns an unchanged copy of the input.
//!
//! New attachments are always freshly constructed nodes, so no operation can
//! move a node under its own descendant.

use std::collections::HashSet;

use gridview_model::{
    FieldDef, FieldRegistry, FilterGroup, FilterLeaf, FilterNode, FilterValue, LogicalOp, NodeId,
};
use tracing::debug;

use crate::error::{Result, TreeError};

/// Changes requested for a leaf. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafPatch {
    pub field: Option<String>,
    pub operator: Option<String>,
    pub value: Option<FilterValue>,
}

impl LeafPatch {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn operator(operator: impl Into<String>) -> Self {
        Self {
            operator: Some(operator.into()),
            ..Self::default()
        }
    }

    pub fn value(value: FilterValue) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_none() && self.operator.is_none() && self.value.is_none()
    }
}

/// Fresh empty root: `AND`, no children, new id.
pub fn clear() -> FilterGroup {
    FilterGroup::new(LogicalOp::And)
}

/// Append a new leaf for `field` under the group `parent_id`.
///
/// The leaf gets the field's first allowed operator and the type's default
/// value. No-op when the parent is not a group or the field allows no
/// operators.
pub fn add_leaf(tree: &FilterGroup, parent_id: &str, field: &FieldDef) -> FilterGroup {
    let Some(operator) = field.default_operator() else {
        debug!(field = %field.name, "field has no operators, leaf not added");
        return tree.clone();
    };
    let leaf = FilterLeaf {
        id: NodeId::generate(),
        field: field.name.clone(),
        operator: operator.to_string(),
        value: field.field_type.default_value(),
    };
    with_group(tree, parent_id, |group| {
        Some(appended(group, FilterNode::Leaf(leaf)))
    })
    .unwrap_or_else(|| {
        debug!(parent_id, "parent group not found, leaf not added");
        tree.clone()
    })
}

/// Append a new empty group under the group `parent_id`.
pub fn add_group(tree: &FilterGroup, parent_id: &str, logical: LogicalOp) -> FilterGroup {
    let group = FilterGroup::new(logical);
    with_group(tree, parent_id, |parent| {
        Some(appended(parent, FilterNode::Group(group)))
    })
    .unwrap_or_else(|| {
        debug!(parent_id, "parent group not found, group not added");
        tree.clone()
    })
}

/// Remove the node `node_id` (with its whole subtree). The root cannot be
/// removed.
pub fn remove_node(tree: &FilterGroup, node_id: &str) -> FilterGroup {
    with_parent(tree, node_id, |parent, index| {
        let children = parent
            .children
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, child)| child.clone())
            .collect();
        Some(FilterGroup {
            id: parent.id.clone(),
            logical: parent.logical,
            children,
        })
    })
    .unwrap_or_else(|| tree.clone())
}

/// Apply `patch` to the leaf `node_id`.
///
/// When the field changes, the operator is kept only if the new field
/// allows it (otherwise it resets to the field's first operator), and the
/// value resets to the new type's default if the data type changed. An
/// explicit operator must be allowed by the resulting field, and a new field
/// must exist in the registry; otherwise the whole patch is a no-op.
pub fn update_leaf(
    tree: &FilterGroup,
    node_id: &str,
    patch: &LeafPatch,
    registry: &FieldRegistry,
) -> FilterGroup {
    with_parent(tree, node_id, |parent, index| {
        let leaf = parent.children[index].as_leaf()?;
        let patched = patched_leaf(leaf, patch, registry)?;
        Some(replaced(parent, index, FilterNode::Leaf(patched)))
    })
    .unwrap_or_else(|| tree.clone())
}

/// Set AND/OR on the group `group_id`.
pub fn set_logical(tree: &FilterGroup, group_id: &str, logical: LogicalOp) -> FilterGroup {
    with_group(tree, group_id, |group| {
        (group.logical != logical).then(|| FilterGroup {
            id: group.id.clone(),
            logical,
            children: group.children.clone(),
        })
    })
    .unwrap_or_else(|| tree.clone())
}

/// Check the structural invariants of a tree received from outside:
/// every id is non-empty and unique.
pub fn validate_tree(tree: &FilterGroup) -> Result<()> {
    let mut seen = HashSet::new();
    for id in tree.node_ids() {
        if id.as_str().is_empty() {
            return Err(TreeError::EmptyId);
        }
        if !seen.insert(id) {
            return Err(TreeError::DuplicateId(id.clone()));
        }
    }
    Ok(())
}

fn patched_leaf(
    leaf: &FilterLeaf,
    patch: &LeafPatch,
    registry: &FieldRegistry,
) -> Option<FilterLeaf> {
    let field_changed = patch
        .field
        .as_ref()
        .is_some_and(|field| *field != leaf.field);
    let field_name = patch.field.as_deref().unwrap_or(&leaf.field);

    let Some(def) = registry.get(field_name) else {
        // Unknown fields cannot validate operators; only the value may change.
        if field_changed || patch.operator.is_some() {
            debug!(field = field_name, "field not in registry, leaf unchanged");
            return None;
        }
        let value = patch.value.clone()?;
        return (value != leaf.value).then(|| FilterLeaf {
            value,
            ..leaf.clone()
        });
    };

    let operator = match &patch.operator {
        Some(operator) if def.allows(operator) => operator.clone(),
        Some(operator) => {
            debug!(field = %def.name, operator, "operator not allowed, leaf unchanged");
            return None;
        }
        None if field_changed && !def.allows(&leaf.operator) => {
            def.default_operator()?.to_string()
        }
        None => leaf.operator.clone(),
    };

    let type_changed = field_changed
        && registry
            .get(&leaf.field)
            .is_none_or(|old| old.field_type != def.field_type);
    let value = match &patch.value {
        Some(value) => value.clone(),
        None if type_changed => def.field_type.default_value(),
        None => leaf.value.clone(),
    };

    let next = FilterLeaf {
        id: leaf.id.clone(),
        field: def.name.clone(),
        operator,
        value,
    };
    (next != *leaf).then_some(next)
}

/// Rebuild the path to the group `id` with `edit` applied to it.
fn with_group<F>(tree: &FilterGroup, id: &str, edit: F) -> Option<FilterGroup>
where
    F: FnOnce(&FilterGroup) -> Option<FilterGroup>,
{
    if tree.id == id {
        return edit(tree);
    }
    with_parent(tree, id, |parent, index| {
        let group = parent.children[index].as_group()?;
        let rebuilt = edit(group)?;
        Some(replaced(parent, index, FilterNode::Group(rebuilt)))
    })
}

/// Rebuild the path to the group that directly contains `id`, with `edit`
/// applied to that parent and the child's index.
fn with_parent<F>(group: &FilterGroup, id: &str, edit: F) -> Option<FilterGroup>
where
    F: FnOnce(&FilterGroup, usize) -> Option<FilterGroup>,
{
    if let Some(index) = group.children.iter().position(|child| child.id() == id) {
        return edit(group, index);
    }
    let (index, subgroup) = group
        .children
        .iter()
        .enumerate()
        .find_map(|(index, child)| match child {
            FilterNode::Group(subgroup) if subgroup.find(id).is_some() => Some((index, subgroup)),
            _ => None,
        })?;
    let rebuilt = with_parent(subgroup, id, edit)?;
    Some(replaced(group, index, FilterNode::Group(rebuilt)))
}

fn appended(group: &FilterGroup, node: FilterNode) -> FilterGroup {
    let mut children = group.children.clone();
    children.push(node);
    FilterGroup {
        id: group.id.clone(),
        logical: group.logical,
        children,
    }
}

fn replaced(group: &FilterGroup, index: usize, node: FilterNode) -> FilterGroup {
    let mut node = Some(node);
    let children = group
        .children
        .iter()
        .enumerate()
        .map(|(i, child)| match node.take_if(|_| i == index) {
            Some(node) => node,
            None => child.clone(),
        })
        .collect();
    FilterGroup {
        id: group.id.clone(),
        logical: group.logical,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridview_model::FieldType;

    fn registry() -> FieldRegistry {
        FieldRegistry::new(vec![
            FieldDef::new("balance", "Balance", FieldType::Number, &["=", ">", "<"]),
            FieldDef::new("description", "Description", FieldType::String, &["contains"]),
            FieldDef::new("name", "Name", FieldType::String, &["=", "contains"]),
        ])
    }

    fn first_leaf(tree: &FilterGroup) -> &FilterLeaf {
        tree.children[0].as_leaf().unwrap()
    }

    #[test]
    fn clear_returns_empty_and_group() {
        let tree = clear();
        assert!(tree.is_empty());
        assert_eq!(tree.logical, LogicalOp::And);
        assert_ne!(clear().id, tree.id);
    }

    #[test]
    fn add_leaf_uses_field_defaults() {
        let registry = registry();
        let root = clear();
        let tree = add_leaf(&root, root.id.as_str(), registry.get("balance").unwrap());
        let leaf = first_leaf(&tree);
        assert_eq!(leaf.field, "balance");
        assert_eq!(leaf.operator, "=");
        assert_eq!(leaf.value, FilterValue::Number(0.0));
        assert!(root.is_empty(), "input tree must be untouched");
    }

    #[test]
    fn add_leaf_to_missing_parent_is_noop() {
        let registry = registry();
        let root = clear();
        let tree = add_leaf(&root, "nope", registry.get("balance").unwrap());
        assert_eq!(tree, root);
    }

    #[test]
    fn add_leaf_under_leaf_is_noop() {
        let registry = registry();
        let root = clear();
        let tree = add_leaf(&root, root.id.as_str(), registry.get("name").unwrap());
        let leaf_id = first_leaf(&tree).id.clone();
        let again = add_leaf(&tree, leaf_id.as_str(), registry.get("name").unwrap());
        assert_eq!(again, tree);
    }

    #[test]
    fn field_without_operators_is_rejected() {
        let root = clear();
        let field = FieldDef::new("flag", "Flag", FieldType::Boolean, &[]);
        assert_eq!(add_leaf(&root, root.id.as_str(), &field), root);
    }

    #[test]
    fn nested_groups_and_removal() {
        let registry = registry();
        let root = clear();
        let tree = add_group(&root, root.id.as_str(), LogicalOp::Or);
        let group_id = tree.children[0].id().clone();
        let tree = add_leaf(&tree, group_id.as_str(), registry.get("name").unwrap());
        let tree = add_leaf(&tree, group_id.as_str(), registry.get("balance").unwrap());
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.depth(), 2);

        let nested_leaf = tree.find_group(group_id.as_str()).unwrap().children[1]
            .id()
            .clone();
        let tree = remove_node(&tree, nested_leaf.as_str());
        assert_eq!(tree.leaf_count(), 1);

        let tree = remove_node(&tree, group_id.as_str());
        assert!(tree.is_empty());
    }

    #[test]
    fn root_cannot_be_removed() {
        let root = clear();
        assert_eq!(remove_node(&root, root.id.as_str()), root);
        assert_eq!(remove_node(&root, "missing"), root);
    }

    #[test]
    fn changing_field_resets_operator_and_value() {
        let registry = registry();
        let root = clear();
        let tree = add_leaf(&root, root.id.as_str(), registry.get("balance").unwrap());
        let id = first_leaf(&tree).id.clone();
        let tree = update_leaf(
            &tree,
            id.as_str(),
            &LeafPatch::value(FilterValue::Number(42.0)),
            &registry,
        );
        let tree = update_leaf(&tree, id.as_str(), &LeafPatch::field("description"), &registry);
        let leaf = first_leaf(&tree);
        assert_eq!(leaf.field, "description");
        assert_eq!(leaf.operator, "contains");
        assert_eq!(leaf.value, FilterValue::Text(String::new()));
    }

    #[test]
    fn changing_to_same_type_keeps_value_and_valid_operator() {
        let registry = registry();
        let root = clear();
        let tree = add_leaf(&root, root.id.as_str(), registry.get("description").unwrap());
        let id = first_leaf(&tree).id.clone();
        let tree = update_leaf(
            &tree,
            id.as_str(),
            &LeafPatch::value(FilterValue::Text("acme".to_string())),
            &registry,
        );
        let tree = update_leaf(&tree, id.as_str(), &LeafPatch::field("name"), &registry);
        let leaf = first_leaf(&tree);
        assert_eq!(leaf.operator, "contains");
        assert_eq!(leaf.value, FilterValue::Text("acme".to_string()));
    }

    #[test]
    fn disallowed_operator_is_noop() {
        let registry = registry();
        let root = clear();
        let tree = add_leaf(&root, root.id.as_str(), registry.get("balance").unwrap());
        let id = first_leaf(&tree).id.clone();
        let patched = update_leaf(&tree, id.as_str(), &LeafPatch::operator("contains"), &registry);
        assert_eq!(patched, tree);
        let patched = update_leaf(&tree, id.as_str(), &LeafPatch::operator(">"), &registry);
        assert_eq!(first_leaf(&patched).operator, ">");
    }

    #[test]
    fn unknown_field_is_noop() {
        let registry = registry();
        let root = clear();
        let tree = add_leaf(&root, root.id.as_str(), registry.get("balance").unwrap());
        let id = first_leaf(&tree).id.clone();
        assert_eq!(
            update_leaf(&tree, id.as_str(), &LeafPatch::field("ghost"), &registry),
            tree
        );
    }

    #[test]
    fn update_leaf_targets_only_leaves() {
        let registry = registry();
        let root = clear();
        let tree = add_group(&root, root.id.as_str(), LogicalOp::And);
        let group_id = tree.children[0].id().clone();
        assert_eq!(
            update_leaf(&tree, group_id.as_str(), &LeafPatch::field("name"), &registry),
            tree
        );
    }

    #[test]
    fn set_logical_on_nested_group() {
        let root = clear();
        let tree = add_group(&root, root.id.as_str(), LogicalOp::And);
        let group_id = tree.children[0].id().clone();
        let tree = set_logical(&tree, group_id.as_str(), LogicalOp::Or);
        assert_eq!(
            tree.find_group(group_id.as_str()).map(|g| g.logical),
            Some(LogicalOp::Or)
        );
        let tree = set_logical(&tree, tree.id.clone().as_str(), LogicalOp::Or);
        assert_eq!(tree.logical, LogicalOp::Or);
    }

    #[test]
    fn validate_detects_duplicates() {
        let mut tree = FilterGroup::with_id("root", LogicalOp::And);
        tree.children.push(FilterNode::Group(FilterGroup::with_id("g", LogicalOp::Or)));
        assert!(validate_tree(&tree).is_ok());
        tree.children.push(FilterNode::Group(FilterGroup::with_id("g", LogicalOp::Or)));
        assert_eq!(
            validate_tree(&tree),
            Err(TreeError::DuplicateId(NodeId::from("g")))
        );
        let blank = FilterGroup::with_id("", LogicalOp::And);
        assert_eq!(validate_tree(&blank), Err(TreeError::EmptyId));
    }
}
