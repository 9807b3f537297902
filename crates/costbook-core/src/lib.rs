//! Incremental cost aggregation for project cost-breakdown trees.
//!
//! The [`engine::Engine`] is the single entry point: every mutation runs in
//! one transaction that revalues the touched records ([`valuation`]),
//! recomputes the owning category ([`aggregate`]), and pushes the change up
//! through ancestors and project totals ([`propagate`]). Structural edits go
//! through [`tree`], which guards against parent cycles.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod input;
pub mod propagate;
pub mod quantity;
pub mod tree;
pub mod valuation;

pub use engine::Engine;
pub use error::{EngineError, Result};
