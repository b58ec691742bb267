//! Structural errors of filter trees.
//!
//! Mutations never fail (invalid requests are no-ops); these errors are
//! reported by [`crate::tree::validate_tree`] for trees that arrive from
//! outside, such as a stored preference document.

use thiserror::Error;

use gridview_model::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("filter node has an empty id")]
    EmptyId,
    #[error("duplicate filter node id: {0}")]
    DuplicateId(NodeId),
}

pub type Result<T> = std::result::Result<T, TreeError>;
