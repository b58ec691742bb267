use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown field type: {0}")]
    UnknownFieldType(String),
    #[error("unknown logical operator: {0}")]
    UnknownLogical(String),
    #[error("unknown sort direction: {0}")]
    UnknownSortDirection(String),
    #[error("invalid preference document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
