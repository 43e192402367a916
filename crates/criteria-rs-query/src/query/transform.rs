//! Derivation of new queries from existing ones.
//!
//! [`QueryTransformer`] builds a row-count query from an entity query and
//! produces structural clones with or without the projection. Source queries
//! are never mutated; every derivation starts from a fresh [`CriteriaQuery`]
//! and rebuilds the shape through a [`CriteriaCopier`].

use tracing::debug;

use std::sync::Arc;

use criteria_rs_core::{CriteriaError, CriteriaResult};

use super::copy::{CriteriaCopier, ProviderProfile};
use super::criteria::{CriteriaQuery, ResultType, Selection};

/// Derives count queries and clones from existing queries.
#[derive(Debug, Clone, Default)]
pub struct QueryTransformer {
    copier: CriteriaCopier,
}

impl QueryTransformer {
    /// Creates a transformer for the given provider.
    pub fn new(profile: ProviderProfile) -> Self {
        Self {
            copier: CriteriaCopier::new(profile),
        }
    }

    /// Creates a transformer around an existing copier.
    pub const fn with_copier(copier: CriteriaCopier) -> Self {
        Self { copier }
    }

    /// Returns the copier this transformer derives queries with.
    pub const fn copier(&self) -> &CriteriaCopier {
        &self.copier
    }

    /// Builds a `SELECT COUNT` query matching the source query's shape.
    ///
    /// The derived query keeps the roots, joins, restriction, grouping, and
    /// group restriction of the source but drops fetches and ordering; its
    /// projection counts the root corresponding to the source's result type,
    /// distinct when the source was distinct.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::UnsupportedResultType`] when the source does
    /// not produce entity rows, [`CriteriaError::MissingRoot`] when no root
    /// matches the result type, and [`CriteriaError::AmbiguousRoot`] when
    /// more than one does.
    pub fn count_query(&self, source: &CriteriaQuery) -> CriteriaResult<CriteriaQuery> {
        let entity = source.result_entity().ok_or_else(|| {
            CriteriaError::UnsupportedResultType(format!("{:?}", source.result))
        })?;

        let mut count = CriteriaQuery::with_result_type(ResultType::Long);
        self.copier.copy_shape(source, &mut count, false);

        let root_index = self.resolve_count_root(source, &mut count, entity)?;
        let alias = self
            .copier
            .alias_generator()
            .get_or_create(&mut count.roots[root_index]);
        debug!(entity, %alias, "derived count query");

        count.selection = Some(Arc::new(Selection::Count {
            root: alias,
            distinct: source.distinct,
        }));
        // DISTINCT moves inside the aggregate; the outer flag must not
        // survive or the count row itself would be deduplicated.
        count.distinct = false;
        Ok(count)
    }

    /// Finds (or materializes) the single root of `entity` in the derived
    /// query and returns its index.
    fn resolve_count_root(
        &self,
        source: &CriteriaQuery,
        count: &mut CriteriaQuery,
        entity: &str,
    ) -> CriteriaResult<usize> {
        let matching: Vec<usize> = count
            .roots
            .iter()
            .enumerate()
            .filter(|(_, r)| r.entity == entity)
            .map(|(i, _)| i)
            .collect();

        match matching.len() {
            1 => Ok(matching[0]),
            0 => {
                // Root copying is skipped for providers that derive roots
                // from the restriction; the count projection still needs a
                // concrete root to aggregate over, so materialize one here.
                if self.copier.profile().derives_roots_from_predicate
                    && source.where_clause.is_some()
                {
                    let idx = count.roots.len();
                    count.add_root(entity);
                    Ok(idx)
                } else {
                    Err(CriteriaError::MissingRoot(entity.to_string()))
                }
            }
            _ => Err(CriteriaError::AmbiguousRoot(entity.to_string())),
        }
    }

    /// Builds a structural clone of the source query without its projection
    /// or a result-type change. Fetches and ordering are carried over.
    pub fn clone_no_selection(&self, source: &CriteriaQuery) -> CriteriaQuery {
        let mut clone = CriteriaQuery::with_result_type(source.result.clone());
        self.copier.copy_no_selection(source, &mut clone);
        clone
    }

    /// Builds a full structural clone of the source query, sharing the
    /// projection by reference.
    pub fn clone_query(&self, source: &CriteriaQuery) -> CriteriaQuery {
        let mut clone = self.clone_no_selection(source);
        if let Some(selection) = &source.selection {
            clone.selection = Some(Arc::clone(selection));
        }
        clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::alias::AliasGenerator;
    use crate::query::criteria::{Aliased, JoinKind, OrderBy};
    use crate::query::predicate::{Lookup, Operand, Predicate};

    fn transformer() -> QueryTransformer {
        QueryTransformer::with_copier(CriteriaCopier::with_generator(
            ProviderProfile::standard(),
            AliasGenerator::new(),
        ))
    }

    fn source_query() -> CriteriaQuery {
        let mut q = CriteriaQuery::new("Order");
        let root = q.add_root("Order");
        root.set_alias("o".to_string());
        root.join("items", "OrderItem", JoinKind::Inner)
            .set_alias("i".to_string());
        root.fetch("customer", "Customer");
        q.where_clause = Some(Arc::new(Predicate::filter(
            "o.total",
            Lookup::Gt(Operand::from(100)),
        )));
        q.order_by = vec![OrderBy::desc("o.total")];
        q
    }

    // ── Count derivation ─────────────────────────────────────────────

    #[test]
    fn test_count_query_counts_result_root() {
        let source = source_query();
        let count = transformer().count_query(&source).unwrap();

        assert_eq!(count.result, ResultType::Long);
        assert_eq!(
            *count.selection.as_ref().unwrap().as_ref(),
            Selection::Count {
                root: "o".to_string(),
                distinct: false,
            }
        );
    }

    #[test]
    fn test_count_query_keeps_shape_drops_fetches_and_ordering() {
        let source = source_query();
        let count = transformer().count_query(&source).unwrap();

        assert_eq!(count.roots.len(), 1);
        assert_eq!(count.roots[0].joins.len(), 1);
        assert!(count.roots[0].fetches.is_empty());
        assert!(count.order_by.is_empty());

        let source_where = source.where_clause.as_ref().unwrap();
        let count_where = count.where_clause.as_ref().unwrap();
        assert!(Arc::ptr_eq(source_where, count_where));
    }

    #[test]
    fn test_count_query_distinct_moves_into_aggregate() {
        let mut source = source_query();
        source.distinct = true;
        let count = transformer().count_query(&source).unwrap();

        assert!(!count.distinct);
        assert_eq!(
            *count.selection.as_ref().unwrap().as_ref(),
            Selection::Count {
                root: "o".to_string(),
                distinct: true,
            }
        );
    }

    #[test]
    fn test_count_query_aliases_unaliased_root() {
        let mut source = CriteriaQuery::new("Order");
        source.add_root("Order");
        let count = transformer().count_query(&source).unwrap();

        // The copy is aliased during shape copying; the count projection
        // reuses that alias rather than generating a second one.
        let alias = count.roots[0].alias.as_deref().unwrap();
        assert_eq!(alias, "generatedAlias0");
        assert_eq!(
            *count.selection.as_ref().unwrap().as_ref(),
            Selection::Count {
                root: alias.to_string(),
                distinct: false,
            }
        );
    }

    #[test]
    fn test_count_query_source_is_untouched() {
        let source = source_query();
        let before = source.roots[0].alias.clone();
        let _ = transformer().count_query(&source).unwrap();
        assert_eq!(source.roots[0].alias, before);
        assert_eq!(source.result, ResultType::Entity("Order".to_string()));
    }

    // ── Count failure modes ──────────────────────────────────────────

    #[test]
    fn test_count_query_rejects_non_entity_result() {
        let source = CriteriaQuery::with_result_type(ResultType::Long);
        let err = transformer().count_query(&source).unwrap_err();
        assert!(matches!(err, CriteriaError::UnsupportedResultType(_)));
    }

    #[test]
    fn test_count_query_missing_root() {
        let mut source = CriteriaQuery::new("Order");
        source.add_root("Customer");
        let err = transformer().count_query(&source).unwrap_err();
        assert!(matches!(err, CriteriaError::MissingRoot(e) if e == "Order"));
    }

    #[test]
    fn test_count_query_ambiguous_root() {
        let mut source = CriteriaQuery::new("Order");
        source.add_root("Order");
        source.add_root("Order");
        let err = transformer().count_query(&source).unwrap_err();
        assert!(matches!(err, CriteriaError::AmbiguousRoot(e) if e == "Order"));
    }

    // ── Provider-specific root materialization ───────────────────────

    #[test]
    fn test_count_query_materializes_root_for_derived_root_provider() {
        let source = source_query();
        let transformer = QueryTransformer::with_copier(CriteriaCopier::with_generator(
            ProviderProfile::predicate_derived_roots(),
            AliasGenerator::new(),
        ));
        let count = transformer.count_query(&source).unwrap();

        // Roots were not copied, so the transformer adds one to count over.
        assert_eq!(count.roots.len(), 1);
        assert_eq!(count.roots[0].entity, "Order");
        assert!(count.roots[0].joins.is_empty());
        assert!(count.selection.is_some());
    }

    #[test]
    fn test_count_query_derived_root_provider_without_restriction() {
        let mut source = source_query();
        source.where_clause = None;
        let transformer = QueryTransformer::with_copier(CriteriaCopier::with_generator(
            ProviderProfile::predicate_derived_roots(),
            AliasGenerator::new(),
        ));
        // Without a restriction the roots copy normally.
        let count = transformer.count_query(&source).unwrap();
        assert_eq!(count.roots[0].alias.as_deref(), Some("o"));
    }

    // ── Clones ───────────────────────────────────────────────────────

    #[test]
    fn test_clone_no_selection() {
        let mut source = source_query();
        source.selection = Some(Arc::new(Selection::Root("o".to_string())));
        let clone = transformer().clone_no_selection(&source);

        assert_eq!(clone.result, source.result);
        assert_eq!(clone.roots[0].fetches.len(), 1);
        assert_eq!(clone.order_by, source.order_by);
        assert!(clone.selection.is_none());
    }

    #[test]
    fn test_clone_query_shares_selection() {
        let mut source = source_query();
        let selection = Arc::new(Selection::Root("o".to_string()));
        source.selection = Some(Arc::clone(&selection));
        let clone = transformer().clone_query(&source);

        assert!(Arc::ptr_eq(&selection, clone.selection.as_ref().unwrap()));
    }
}
