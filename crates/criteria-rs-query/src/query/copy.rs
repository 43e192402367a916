//! Structural copying of criteria queries.
//!
//! The [`CriteriaCopier`] rebuilds the root/join/fetch shape of a source
//! query onto a destination query, carrying aliases so that predicates that
//! reference nodes by alias keep resolving. The where and having clauses are
//! shared by reference ([`Arc::clone`]), never deep-copied.
//!
//! Some providers resolve a query's roots lazily from its restriction rather
//! than from the declared root list; [`ProviderProfile`] captures that
//! behavior as an explicit capability so the copier can skip root
//! reconstruction when the provider would materialize the roots itself.

use tracing::{debug, trace};

use std::sync::Arc;

use super::alias::AliasGenerator;
use super::criteria::{Aliased, CriteriaQuery, Fetch, Join, Root};

/// Capability flags describing the persistence provider in use.
///
/// The default profile describes a standard provider that takes the declared
/// root list at face value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderProfile {
    /// The provider derives a query's roots from its restriction, so copying
    /// the declared roots would duplicate them.
    pub derives_roots_from_predicate: bool,
}

impl ProviderProfile {
    /// A provider that trusts the declared root list.
    pub const fn standard() -> Self {
        Self {
            derives_roots_from_predicate: false,
        }
    }

    /// A provider that rebuilds roots from the restriction when one is set.
    pub const fn predicate_derived_roots() -> Self {
        Self {
            derives_roots_from_predicate: true,
        }
    }
}

/// Copies the structural shape of one query onto another.
#[derive(Debug, Clone)]
pub struct CriteriaCopier {
    profile: ProviderProfile,
    aliases: AliasGenerator,
}

impl CriteriaCopier {
    /// Creates a copier for the given provider, using the process-wide
    /// shared alias counter.
    pub fn new(profile: ProviderProfile) -> Self {
        Self {
            profile,
            aliases: AliasGenerator::shared(),
        }
    }

    /// Creates a copier with an explicit alias generator.
    pub fn with_generator(profile: ProviderProfile, aliases: AliasGenerator) -> Self {
        Self { profile, aliases }
    }

    /// Returns the provider profile this copier was built with.
    pub const fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    /// Returns the alias generator this copier assigns aliases with.
    pub const fn alias_generator(&self) -> &AliasGenerator {
        &self.aliases
    }

    /// Copies roots, joins, grouping, the restriction, the group restriction,
    /// and the distinct flag from `from` onto `to`. Fetches are copied only
    /// when `copy_fetches` is set.
    ///
    /// Ordering and the selection are deliberately left out; they rarely
    /// survive a transformation unchanged (a count query drops both).
    pub fn copy_shape(&self, from: &CriteriaQuery, to: &mut CriteriaQuery, copy_fetches: bool) {
        if self.profile.derives_roots_from_predicate && from.where_clause.is_some() {
            // The provider will rebuild the roots from the restriction;
            // copying them here would register each root twice.
            debug!("skipping root copy: provider derives roots from the restriction");
        } else {
            for root in &from.roots {
                let copied = to.add_root(root.entity.clone());
                self.carry_alias(root, copied);
                self.copy_join_tree(root, copied);
                if copy_fetches {
                    self.copy_fetch_tree(root, copied);
                }
            }
        }

        to.group_by = from.group_by.clone();
        to.distinct = from.distinct;
        if let Some(predicate) = &from.where_clause {
            to.where_clause = Some(Arc::clone(predicate));
        }
        if let Some(predicate) = &from.having {
            to.having = Some(Arc::clone(predicate));
        }
    }

    /// Copies everything [`copy_shape`](Self::copy_shape) does, plus fetches
    /// and ordering. Only the selection is left unset.
    pub fn copy_no_selection(&self, from: &CriteriaQuery, to: &mut CriteriaQuery) {
        self.copy_shape(from, to, true);
        to.order_by = from.order_by.clone();
    }

    /// Reuses the source node's alias on the copy, or assigns a generated
    /// alias to the copy when the source has none. The source is never
    /// touched, so repeated copies of an unaliased graph stay cheap and
    /// deterministic per copy.
    fn carry_alias<A: Aliased>(&self, from: &A, to: &mut A) {
        if let Some(alias) = from.alias() {
            to.set_alias(alias.to_string());
        } else {
            let alias = self.aliases.get_or_create(to);
            trace!(%alias, "assigned generated alias to copied node");
        }
    }

    fn copy_join_tree(&self, from: &Root, to: &mut Root) {
        for join in &from.joins {
            let idx = to.joins.len();
            to.joins.push(Join::new(
                join.attribute.clone(),
                join.entity.clone(),
                join.kind,
            ));
            self.copy_join_children(join, &mut to.joins[idx]);
        }
    }

    fn copy_join_children(&self, from: &Join, to: &mut Join) {
        self.carry_alias(from, to);
        for join in &from.joins {
            let idx = to.joins.len();
            to.joins.push(Join::new(
                join.attribute.clone(),
                join.entity.clone(),
                join.kind,
            ));
            self.copy_join_children(join, &mut to.joins[idx]);
        }
    }

    fn copy_fetch_tree(&self, from: &Root, to: &mut Root) {
        for fetch in &from.fetches {
            let idx = to.fetches.len();
            to.fetches
                .push(Fetch::new(fetch.attribute.clone(), fetch.entity.clone()));
            self.copy_fetch_children(fetch, &mut to.fetches[idx]);
        }
    }

    fn copy_fetch_children(&self, from: &Fetch, to: &mut Fetch) {
        self.carry_alias(from, to);
        for fetch in &from.fetches {
            let idx = to.fetches.len();
            to.fetches
                .push(Fetch::new(fetch.attribute.clone(), fetch.entity.clone()));
            self.copy_fetch_children(fetch, &mut to.fetches[idx]);
        }
    }
}

impl Default for CriteriaCopier {
    fn default() -> Self {
        Self::new(ProviderProfile::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::criteria::{JoinKind, OrderBy, ResultType, Selection};
    use crate::query::predicate::{Lookup, Operand, Predicate};

    fn copier() -> CriteriaCopier {
        CriteriaCopier::with_generator(ProviderProfile::standard(), AliasGenerator::new())
    }

    fn source_query() -> CriteriaQuery {
        let mut q = CriteriaQuery::new("Order");
        let root = q.add_root("Order");
        root.set_alias("o".to_string());
        let items = root.join("items", "OrderItem", JoinKind::Inner);
        items.set_alias("i".to_string());
        items.join("product", "Product", JoinKind::Left);
        root.fetch("customer", "Customer");
        q.where_clause = Some(Arc::new(Predicate::filter(
            "o.total",
            Lookup::Gt(Operand::from(100)),
        )));
        q.group_by = vec!["o.status".to_string()];
        q.having = Some(Arc::new(Predicate::filter(
            "o.status",
            Lookup::Exact(Operand::from("OPEN")),
        )));
        q.order_by = vec![OrderBy::desc("o.total")];
        q.distinct = true;
        q
    }

    // ── Shape fidelity ───────────────────────────────────────────────

    #[test]
    fn test_copy_shape_rebuilds_join_tree() {
        let from = source_query();
        let mut to = CriteriaQuery::with_result_type(ResultType::Long);
        copier().copy_shape(&from, &mut to, false);

        assert_eq!(to.roots.len(), 1);
        let root = &to.roots[0];
        assert_eq!(root.entity, "Order");
        assert_eq!(root.alias.as_deref(), Some("o"));
        assert_eq!(root.joins.len(), 1);
        assert_eq!(root.joins[0].alias.as_deref(), Some("i"));
        assert_eq!(root.joins[0].kind, JoinKind::Inner);
        assert_eq!(root.joins[0].joins[0].entity, "Product");
        assert_eq!(root.joins[0].joins[0].kind, JoinKind::Left);
    }

    #[test]
    fn test_copy_shape_without_fetches() {
        let from = source_query();
        let mut to = CriteriaQuery::with_result_type(ResultType::Long);
        copier().copy_shape(&from, &mut to, false);
        assert!(to.roots[0].fetches.is_empty());
    }

    #[test]
    fn test_copy_shape_with_fetches() {
        let from = source_query();
        let mut to = CriteriaQuery::new("Order");
        copier().copy_shape(&from, &mut to, true);
        assert_eq!(to.roots[0].fetches.len(), 1);
        assert_eq!(to.roots[0].fetches[0].entity, "Customer");
    }

    #[test]
    fn test_copy_shape_carries_grouping_and_distinct() {
        let from = source_query();
        let mut to = CriteriaQuery::with_result_type(ResultType::Long);
        copier().copy_shape(&from, &mut to, false);
        assert_eq!(to.group_by, vec!["o.status".to_string()]);
        assert!(to.distinct);
    }

    // ── Clause sharing ───────────────────────────────────────────────

    #[test]
    fn test_restrictions_are_shared_not_copied() {
        let from = source_query();
        let mut to = CriteriaQuery::with_result_type(ResultType::Long);
        copier().copy_shape(&from, &mut to, false);

        let from_where = from.where_clause.as_ref().unwrap();
        let to_where = to.where_clause.as_ref().unwrap();
        assert!(Arc::ptr_eq(from_where, to_where));

        let from_having = from.having.as_ref().unwrap();
        let to_having = to.having.as_ref().unwrap();
        assert!(Arc::ptr_eq(from_having, to_having));
    }

    #[test]
    fn test_absent_restriction_stays_absent() {
        let mut from = source_query();
        from.where_clause = None;
        from.having = None;
        let mut to = CriteriaQuery::with_result_type(ResultType::Long);
        copier().copy_shape(&from, &mut to, false);
        assert!(to.where_clause.is_none());
        assert!(to.having.is_none());
    }

    // ── Exclusions ───────────────────────────────────────────────────

    #[test]
    fn test_copy_shape_excludes_ordering_and_selection() {
        let mut from = source_query();
        from.selection = Some(Arc::new(Selection::Root("o".to_string())));
        let mut to = CriteriaQuery::with_result_type(ResultType::Long);
        copier().copy_shape(&from, &mut to, false);
        assert!(to.order_by.is_empty());
        assert!(to.selection.is_none());
    }

    #[test]
    fn test_copy_no_selection_carries_ordering() {
        let mut from = source_query();
        from.selection = Some(Arc::new(Selection::Root("o".to_string())));
        let mut to = CriteriaQuery::new("Order");
        copier().copy_no_selection(&from, &mut to);
        assert_eq!(to.order_by, vec![OrderBy::desc("o.total")]);
        assert!(to.selection.is_none());
    }

    // ── Aliasing ─────────────────────────────────────────────────────

    #[test]
    fn test_unaliased_root_gets_generated_alias_on_copy() {
        let mut from = CriteriaQuery::new("Order");
        from.add_root("Order");
        let mut to = CriteriaQuery::with_result_type(ResultType::Long);
        copier().copy_shape(&from, &mut to, false);

        // The source stays untouched; the copy gets a synthetic alias.
        assert!(from.roots[0].alias.is_none());
        assert_eq!(to.roots[0].alias.as_deref(), Some("generatedAlias0"));
    }

    // ── Provider-specific root handling ──────────────────────────────

    #[test]
    fn test_predicate_derived_roots_skips_root_copy() {
        let from = source_query();
        let copier = CriteriaCopier::with_generator(
            ProviderProfile::predicate_derived_roots(),
            AliasGenerator::new(),
        );
        let mut to = CriteriaQuery::with_result_type(ResultType::Long);
        copier.copy_shape(&from, &mut to, false);

        assert!(to.roots.is_empty());
        // Everything else still transfers.
        assert!(to.where_clause.is_some());
        assert!(to.distinct);
    }

    #[test]
    fn test_predicate_derived_roots_copies_when_unrestricted() {
        let mut from = source_query();
        from.where_clause = None;
        let copier = CriteriaCopier::with_generator(
            ProviderProfile::predicate_derived_roots(),
            AliasGenerator::new(),
        );
        let mut to = CriteriaQuery::with_result_type(ResultType::Long);
        copier.copy_shape(&from, &mut to, false);
        assert_eq!(to.roots.len(), 1);
    }
}
