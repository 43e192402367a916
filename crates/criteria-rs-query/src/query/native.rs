//! Native SQL row counting.
//!
//! Counting through a derived criteria query fails when the source query has
//! no root matching its result type or several of them. The fallback here
//! side-steps root resolution entirely: translate the source query as-is,
//! wrap it in `select count(*) from (...) a`, and rebind its parameters
//! positionally.
//!
//! Parameter remapping scans the wrapped SQL left-to-right, skipping quoted
//! regions, and replaces the k-th parameter token (`?` or `:name`) with the
//! dialect's placeholder for position `k + 1`. Named parameters are resolved
//! from the caller's bindings at that point.

use std::collections::HashMap;

use tracing::debug;

use criteria_rs_core::{CriteriaError, CriteriaResult};

use crate::query::criteria::CriteriaQuery;
use crate::query::transform::QueryTransformer;
use crate::query::translate::{ParamSlot, SqlTranslator, TranslatedQuery};
use crate::value::Value;

/// A ready-to-execute native count statement.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCountQuery {
    /// The wrapped SQL with dialect placeholders.
    pub sql: String,
    /// Positional bindings as `(position, value)` pairs, 1-based.
    pub bindings: Vec<(usize, Value)>,
}

/// How a row count will be executed.
#[derive(Debug, Clone)]
pub enum CountPlan {
    /// A derived criteria count query, executable through the provider.
    Criteria(CriteriaQuery),
    /// A native SQL statement wrapping the translated source query.
    Native(NativeCountQuery),
}

/// Translates the query and wraps it in a native `count(*)` statement.
///
/// `named` supplies values for the query's named parameters.
///
/// # Errors
///
/// Fails when translation fails or a named parameter has no binding.
pub fn native_count_query(
    translator: &SqlTranslator,
    query: &CriteriaQuery,
    named: &HashMap<String, Value>,
) -> CriteriaResult<NativeCountQuery> {
    let translated = translator.translate_select(query)?;
    wrap_count(&translated, translator, named)
}

/// Plans a row count for the source query: a derived criteria count when the
/// source's roots allow it, otherwise the native fallback.
///
/// Only root-resolution failures trigger the fallback; any other error is
/// genuine and propagates.
pub fn count_plan(
    transformer: &QueryTransformer,
    translator: &SqlTranslator,
    source: &CriteriaQuery,
    named: &HashMap<String, Value>,
) -> CriteriaResult<CountPlan> {
    match transformer.count_query(source) {
        Ok(count) => Ok(CountPlan::Criteria(count)),
        Err(CriteriaError::MissingRoot(entity) | CriteriaError::AmbiguousRoot(entity)) => {
            debug!(%entity, "falling back to native count");
            native_count_query(translator, source, named).map(CountPlan::Native)
        }
        Err(err) => Err(err),
    }
}

/// Wraps a translated query in `select count(*) from (...) a`, rewriting its
/// parameter tokens into positional dialect placeholders.
pub fn wrap_count(
    translated: &TranslatedQuery,
    translator: &SqlTranslator,
    named: &HashMap<String, Value>,
) -> CriteriaResult<NativeCountQuery> {
    let wrapped = format!("select count(*) from ({}) a", translated.sql);

    let mut sql = String::with_capacity(wrapped.len());
    let mut bindings = Vec::with_capacity(translated.params.len());
    let mut position = 0_usize;
    let mut chars = wrapped.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            // Quoted regions never contain parameter tokens.
            '\'' | '"' => {
                sql.push(c);
                for inner in chars.by_ref() {
                    sql.push(inner);
                    if inner == c {
                        break;
                    }
                }
            }
            '?' => {
                position += 1;
                sql.push_str(&translator.dialect().placeholder(position));
                bindings.push((position, resolve_slot(translated, position, named)?));
            }
            ':' if chars.peek().is_some_and(|n| is_ident_char(*n)) => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if is_ident_char(n) {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                position += 1;
                sql.push_str(&translator.dialect().placeholder(position));
                let value = resolve_slot(translated, position, named)?;
                // The token name and the recorded slot must agree.
                if translated.params.get(position - 1) != Some(&ParamSlot::Named(name.clone())) {
                    return Err(CriteriaError::TranslationError(format!(
                        "parameter token ':{name}' does not match slot {position}"
                    )));
                }
                bindings.push((position, value));
            }
            _ => sql.push(c),
        }
    }

    if position != translated.params.len() {
        return Err(CriteriaError::TranslationError(format!(
            "found {position} parameter tokens but {} slots",
            translated.params.len()
        )));
    }

    debug!(%sql, bindings = bindings.len(), "wrapped native count query");
    Ok(NativeCountQuery { sql, bindings })
}

fn resolve_slot(
    translated: &TranslatedQuery,
    position: usize,
    named: &HashMap<String, Value>,
) -> CriteriaResult<Value> {
    let slot = translated.params.get(position - 1).ok_or_else(|| {
        CriteriaError::TranslationError(format!(
            "parameter token at position {position} has no recorded slot"
        ))
    })?;
    match slot {
        ParamSlot::Inline(value) => Ok(value.clone()),
        ParamSlot::Named(name) => named
            .get(name)
            .cloned()
            .ok_or_else(|| CriteriaError::MissingParameter(name.clone())),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
