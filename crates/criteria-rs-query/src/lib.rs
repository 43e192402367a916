//! # criteria-rs-query
//!
//! Query introspection and transformation helpers for criteria-style
//! structured queries. Provides the [`CriteriaQuery`](query::CriteriaQuery)
//! AST, the [`Metamodel`](metamodel::Metamodel) describing entity types and
//! their associations, and the transformers that derive new queries from
//! existing ones: structural clones, `SELECT COUNT` derivation, and a native
//! SQL `count(*)` fallback for queries whose roots cannot be resolved.
//!
//! ## Architecture
//!
//! Queries are plain data. A host application builds a
//! [`CriteriaQuery`](query::CriteriaQuery) once and derives what it needs
//! from it: the [`QueryTransformer`](query::QueryTransformer) rebuilds the
//! root/join/fetch shape through a [`CriteriaCopier`](query::CriteriaCopier)
//! while sharing restrictions by reference, and the
//! [`SqlTranslator`](query::SqlTranslator) renders the result against the
//! registered [`Metamodel`](metamodel::Metamodel).
//!
//! ## Module Overview
//!
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`metamodel`] - Entity types, attributes, and their classification
//! - [`query`] - The query AST, transformers, and SQL translation

// These clippy lints are intentionally allowed for the query crate:
// - result_large_err: CriteriaError is the crate error type and is used consistently
// - format_push_string: format! with push_str is clearer than write! for SQL generation
// - doc_markdown: backtick requirements for documentation items are too strict
// - missing_const_for_fn: const-ness of small accessors is not load-bearing
// - option_if_let_else: match reads better than map_or in translation code
#![allow(clippy::result_large_err)]
#![allow(clippy::format_push_string)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::module_name_repetitions)]

pub mod metamodel;
pub mod query;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use metamodel::{
    Attribute, EntityType, Metamodel, PersistentKind, ScalarKind, TypeFilter, TypeRef,
};
pub use query::{
    count_plan, native_count_query, AliasGenerator, Aliased, CountPlan, CriteriaCopier,
    CriteriaQuery, Fetch, Join, JoinKind, Lookup, NativeCountQuery, Operand, OrderBy, ParamSlot,
    Predicate, ProviderDialect, ProviderProfile, QueryTransformer, ResultType, Root, Selection,
    SqlTranslator, TranslatedQuery,
};
pub use value::Value;
