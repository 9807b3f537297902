//! Engine error type.

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by engine operations. Validation errors abort the
/// enclosing transaction; no partial state is committed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("category not found: {0}")]
    MissingCategory(String),

    #[error("category {0} cannot be its own ancestor")]
    CyclicParent(String),

    #[error("growth percentage cannot be negative: {0}")]
    NegativeGrowth(Decimal),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("category {category} belongs to project {actual}, not {expected}")]
    ProjectMismatch {
        category: String,
        actual: String,
        expected: String,
    },

    #[error("storage error")]
    Storage(#[from] rusqlite::Error),
}
