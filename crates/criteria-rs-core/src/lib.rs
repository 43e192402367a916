//! # criteria-rs-core
//!
//! Core error types and logging setup for the criteria-rs query helpers.
//! This crate has no dependencies on the other workspace crates and provides
//! the foundation they build on.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;

// Re-export the most commonly used types at the crate root.
pub use error::{CriteriaError, CriteriaResult};
