//! Query representation, transformation, and translation.
//!
//! This module contains the complete query pipeline:
//!
//! - [`predicate`] - Lookups and composable predicate trees
//! - [`criteria`] - The criteria query AST: roots, joins, fetches
//! - [`alias`] - Generated alias assignment for query nodes
//! - [`copy`] - Structural copying of query graphs
//! - [`transform`] - Count derivation and query cloning
//! - [`translate`] - SQL rendering through the entity metamodel
//! - [`native`] - The native `count(*)` fallback with parameter remapping
//! - [`strings`] - String-level rewrites of rendered query text

pub mod alias;
pub mod copy;
pub mod criteria;
pub mod native;
pub mod predicate;
pub mod strings;
pub mod transform;
pub mod translate;

pub use alias::AliasGenerator;
pub use copy::{CriteriaCopier, ProviderProfile};
pub use criteria::{
    Aliased, CriteriaQuery, Fetch, Join, JoinKind, OrderBy, ResultType, Root, Selection,
};
pub use native::{count_plan, native_count_query, CountPlan, NativeCountQuery};
pub use predicate::{Lookup, Operand, Predicate};
pub use transform::QueryTransformer;
pub use translate::{ParamSlot, ProviderDialect, SqlTranslator, TranslatedQuery};
