//! SQLite persistence for the cost-book engine.
//!
//! Row types and enums live in [`models`], schema setup in [`store`], and
//! per-table query functions in [`queries`]. All arithmetic on the stored
//! values happens in `costbook-core`; this crate only moves rows in and out
//! of the database.

pub mod config;
pub mod models;
pub mod queries;
pub mod store;
