//! # criteria-rs
//!
//! Query introspection and transformation helpers for criteria-style
//! structured queries.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. You can depend on `criteria-rs` to get everything, or depend on
//! individual crates for finer-grained control.

/// Error types and logging setup.
pub use criteria_rs_core as core;

/// The criteria query AST, entity metamodel, transformers, and SQL
/// translation.
pub use criteria_rs_query as query;
