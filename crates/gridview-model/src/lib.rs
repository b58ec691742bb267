//! Data model for tabular resource views.
//!
//! - [`filter`] - the recursive AND/OR filter tree
//! - [`field`] - field definitions screens supply for filtering
//! - [`view`] - column visibility/order, sort and filter state
//! - [`preference`] - server-persisted preference documents

pub mod error;
pub mod field;
pub mod filter;
pub mod preference;
pub mod view;

pub use error::{ModelError, Result};
pub use field::{FieldDef, FieldRegistry, FieldType};
pub use filter::{FilterGroup, FilterLeaf, FilterNode, FilterValue, LogicalOp, NodeId, NodeRef};
pub use preference::{ColumnsPreference, GridPreference, SaveGridPreference, SortPreference};
pub use view::{SortDirection, ViewState};
