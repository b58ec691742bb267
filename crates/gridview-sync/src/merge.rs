//! Hydration: merging a stored preference document into screen defaults.
//!
//! A stored field overrides the default only when it carries something
//! usable. In particular an empty stored column order never replaces a
//! non-empty default.

use gridview_core::validate_tree;
use gridview_model::{GridPreference, ViewState};
use tracing::{debug, warn};

/// Merge `stored` over `defaults`. With no document the defaults apply as-is.
pub fn hydrate(defaults: &ViewState, stored: Option<&GridPreference>) -> ViewState {
    let mut view = defaults.clone();
    let Some(stored) = stored else {
        return view;
    };

    if let Some(visible) = &stored.columns.visible {
        for (column, shown) in visible {
            view.visible_columns.insert(column.clone(), *shown);
        }
    }

    if let Some(order) = stored.columns.order.as_deref() {
        view.columns_order = reconcile_order(&defaults.columns_order, order);
    }

    if let Some(tree) = &stored.columns.filters_tree {
        match validate_tree(tree) {
            Ok(()) => view.filters_tree = tree.clone(),
            Err(error) => warn!(%error, "stored filter tree rejected"),
        }
    }

    if let Some(by) = stored.sort.by.as_deref().filter(|by| !by.is_empty()) {
        view.sort_by = Some(by.to_string());
    }
    if let Some(dir) = stored.sort.dir {
        view.sort_dir = dir;
    }

    view
}

/// Column order after hydration.
///
/// Keeps the stored sequence for columns the screen still declares, then
/// appends declared columns the stored order does not mention. Falls back to
/// the declared order when nothing stored survives.
pub fn reconcile_order(declared: &[String], stored: &[String]) -> Vec<String> {
    if stored.is_empty() {
        return declared.to_vec();
    }
    if declared.is_empty() {
        return stored.to_vec();
    }

    let mut order: Vec<String> = Vec::with_capacity(declared.len());
    for column in stored {
        if declared.contains(column) && !order.contains(column) {
            order.push(column.clone());
        }
    }
    if order.is_empty() {
        debug!("stored column order has no declared columns; keeping defaults");
        return declared.to_vec();
    }
    for column in declared {
        if !order.contains(column) {
            order.push(column.clone());
        }
    }
    order
}
