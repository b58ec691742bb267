//! In-memory view state of one screen.
//!
//! The five pieces of [`ViewState`] are settable independently. Every setter
//! reports whether the state actually changed so an observer can decide to
//! persist.

use std::collections::BTreeMap;

use gridview_model::{
    FieldRegistry, FilterGroup, FilterValue, LogicalOp, SortDirection, ViewState,
};
use tracing::debug;

use crate::tree::{self, LeafPatch};

#[derive(Debug, Clone)]
pub struct ViewStore {
    state: ViewState,
    registry: FieldRegistry,
}

impl ViewStore {
    pub fn new(state: ViewState, registry: FieldRegistry) -> Self {
        Self { state, registry }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn into_state(self) -> ViewState {
        self.state
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Replace the whole state at once (hydration).
    pub fn replace(&mut self, state: ViewState) -> bool {
        set(&mut self.state, state)
    }

    pub fn visible_columns_in_order(&self) -> Vec<&str> {
        self.state.visible_columns_in_order()
    }

    // =========================================================================
    // COLUMNS
    // =========================================================================

    pub fn set_visible_columns(&mut self, visible: BTreeMap<String, bool>) -> bool {
        set(&mut self.state.visible_columns, visible)
    }

    pub fn set_column_visible(&mut self, column: &str, visible: bool) -> bool {
        if self.state.visible_columns.get(column) == Some(&visible) {
            return false;
        }
        self.state
            .visible_columns
            .insert(column.to_string(), visible);
        true
    }

    pub fn toggle_column(&mut self, column: &str) -> bool {
        let visible = self.state.is_visible(column);
        self.set_column_visible(column, !visible)
    }

    pub fn set_columns_order(&mut self, order: Vec<String>) -> bool {
        set(&mut self.state.columns_order, order)
    }

    /// Move `column` to position `to` (clamped to the end). Unknown columns
    /// are ignored.
    pub fn move_column(&mut self, column: &str, to: usize) -> bool {
        let order = &mut self.state.columns_order;
        let Some(from) = order.iter().position(|key| key == column) else {
            debug!(column, "move ignored: column not in order");
            return false;
        };
        let to = to.min(order.len() - 1);
        if from == to {
            return false;
        }
        let key = order.remove(from);
        order.insert(to, key);
        true
    }

    // =========================================================================
    // SORT
    // =========================================================================

    pub fn set_sort(&mut self, sort_by: Option<String>, direction: SortDirection) -> bool {
        let by_changed = set(&mut self.state.sort_by, sort_by);
        let dir_changed = set(&mut self.state.sort_dir, direction);
        by_changed || dir_changed
    }

    /// Clicking a column header: a new column sorts ascending, the current
    /// column flips direction. There is no way back to "unsorted".
    pub fn toggle_sort(&mut self, column: &str) -> bool {
        if self.state.sort_by.as_deref() == Some(column) {
            self.state.sort_dir = self.state.sort_dir.toggled();
        } else {
            self.state.sort_by = Some(column.to_string());
            self.state.sort_dir = SortDirection::Asc;
        }
        true
    }

    // =========================================================================
    // FILTER TREE
    // =========================================================================

    pub fn filters_tree(&self) -> &FilterGroup {
        &self.state.filters_tree
    }

    pub fn set_filters_tree(&mut self, tree: FilterGroup) -> bool {
        set(&mut self.state.filters_tree, tree)
    }

    /// Add a leaf for the registered field `field` under `parent_id`.
    pub fn add_leaf(&mut self, parent_id: &str, field: &str) -> bool {
        let Some(def) = self.registry.get(field) else {
            debug!(field, "leaf not added: field not in registry");
            return false;
        };
        let next = tree::add_leaf(&self.state.filters_tree, parent_id, def);
        self.set_filters_tree(next)
    }

    pub fn add_group(&mut self, parent_id: &str, logical: LogicalOp) -> bool {
        let next = tree::add_group(&self.state.filters_tree, parent_id, logical);
        self.set_filters_tree(next)
    }

    pub fn remove_node(&mut self, node_id: &str) -> bool {
        let next = tree::remove_node(&self.state.filters_tree, node_id);
        self.set_filters_tree(next)
    }

    pub fn update_leaf(&mut self, node_id: &str, patch: &LeafPatch) -> bool {
        let next = tree::update_leaf(&self.state.filters_tree, node_id, patch, &self.registry);
        self.set_filters_tree(next)
    }

    pub fn set_leaf_value(&mut self, node_id: &str, value: FilterValue) -> bool {
        self.update_leaf(node_id, &LeafPatch::value(value))
    }

    pub fn set_logical(&mut self, group_id: &str, logical: LogicalOp) -> bool {
        let next = tree::set_logical(&self.state.filters_tree, group_id, logical);
        self.set_filters_tree(next)
    }

    /// Reset the filter tree to a fresh empty root. An already empty AND
    /// root is kept as is.
    pub fn clear_filters(&mut self) -> bool {
        let tree = &self.state.filters_tree;
        if tree.is_empty() && tree.logical == LogicalOp::And {
            return false;
        }
        self.state.filters_tree = tree::clear();
        true
    }
}

fn set<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
