//! Filter-tree engine and view-state store shared by every tabular screen.
//!
//! # Architecture
//!
//! - `tree` - pure, id-addressed mutations of the filter tree
//! - `compare` - type-aware row ordering
//! - `eval` - client-side evaluation of a filter tree against a row
//! - `table` - filter + sort of a row set according to a view state
//! - `query` - view state as query parameters for server-side filtering
//! - `store` - the mutable per-screen view state

pub mod compare;
pub mod error;
pub mod eval;
pub mod query;
pub mod store;
pub mod table;
pub mod tree;

/// A row of a tabular resource, keyed by column.
pub type Row = serde_json::Map<String, serde_json::Value>;

pub use compare::{compare_rows, compare_text, compare_values, sort_rows};
pub use error::{Result, TreeError};
pub use eval::{OPERATORS, matches};
pub use query::to_query_pairs;
pub use store::ViewStore;
pub use table::{apply_view, project_rows};
pub use tree::{
    LeafPatch, add_group, add_leaf, clear, remove_node, set_logical, update_leaf, validate_tree,
};
