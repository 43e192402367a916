//! Generated alias management for query nodes.
//!
//! The [`AliasGenerator`] hands out synthetic aliases to roots, joins, and
//! fetches that were created without one. Alias assignment is idempotent: a
//! node that already carries an alias is never re-aliased.
//!
//! Generators are explicit objects rather than a hidden global. A fresh
//! generator ([`AliasGenerator::new`]) scopes its counter to one copy
//! operation — aliases only need uniqueness within a single query, so this is
//! always safe and avoids lock contention. [`AliasGenerator::shared`] returns
//! a handle to the process-wide default counter for callers that want
//! process-level uniqueness instead.

use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

use super::criteria::Aliased;

/// Prefix of every generated alias.
pub const GENERATED_ALIAS_PREFIX: &str = "generatedAlias";

/// The counter wraps to zero once it exceeds this value. Aliases are scoped
/// to single-query lifetimes, so reuse across the wrap is harmless.
const ALIAS_COUNTER_MAX: u64 = 1000;

static SHARED_COUNTER: Lazy<Arc<Mutex<u64>>> = Lazy::new(|| Arc::new(Mutex::new(0)));

/// Hands out unique synthetic aliases for query nodes.
///
/// Cloning a generator shares its counter.
#[derive(Debug, Clone)]
pub struct AliasGenerator {
    counter: Arc<Mutex<u64>>,
}

impl AliasGenerator {
    /// Creates a generator with its own counter, starting at zero.
    pub fn new() -> Self {
        Self {
            counter: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns a generator backed by the process-wide shared counter.
    pub fn shared() -> Self {
        Self {
            counter: Arc::clone(&SHARED_COUNTER),
        }
    }

    /// Returns the node's alias, generating and assigning one if absent.
    ///
    /// Idempotent: a second call on the same node returns the alias assigned
    /// by the first. Never fails.
    pub fn get_or_create<A: Aliased + ?Sized>(&self, node: &mut A) -> String {
        if let Some(alias) = node.alias() {
            return alias.to_string();
        }
        let alias = format!("{GENERATED_ALIAS_PREFIX}{}", self.next());
        node.set_alias(alias.clone());
        alias
    }

    fn next(&self) -> u64 {
        let mut counter = self
            .counter
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *counter > ALIAS_COUNTER_MAX {
            *counter = 0;
        }
        let value = *counter;
        *counter += 1;
        value
    }
}

impl Default for AliasGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::criteria::Root;

    #[test]
    fn test_generated_alias_format() {
        let aliases = AliasGenerator::new();
        let mut root = Root::new("Order");
        let alias = aliases.get_or_create(&mut root);
        assert_eq!(alias, "generatedAlias0");
        assert_eq!(root.alias.as_deref(), Some("generatedAlias0"));
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let aliases = AliasGenerator::new();
        let mut root = Root::new("Order");
        let first = aliases.get_or_create(&mut root);
        let second = aliases.get_or_create(&mut root);
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_alias_is_kept() {
        let aliases = AliasGenerator::new();
        let mut root = Root::new("Order");
        root.alias = Some("o".to_string());
        assert_eq!(aliases.get_or_create(&mut root), "o");
    }

    #[test]
    fn test_counter_increments_across_nodes() {
        let aliases = AliasGenerator::new();
        let mut a = Root::new("A");
        let mut b = Root::new("B");
        assert_eq!(aliases.get_or_create(&mut a), "generatedAlias0");
        assert_eq!(aliases.get_or_create(&mut b), "generatedAlias1");
    }

    #[test]
    fn test_counter_wraps_after_1000() {
        let aliases = AliasGenerator::new();
        for i in 0..=1000 {
            let mut node = Root::new("E");
            assert_eq!(
                aliases.get_or_create(&mut node),
                format!("generatedAlias{i}")
            );
        }
        // The 1002nd request finds the counter past the cap and reuses 0.
        let mut node = Root::new("E");
        assert_eq!(aliases.get_or_create(&mut node), "generatedAlias0");
    }

    #[test]
    fn test_cloned_generator_shares_counter() {
        let aliases = AliasGenerator::new();
        let clone = aliases.clone();
        let mut a = Root::new("A");
        let mut b = Root::new("B");
        aliases.get_or_create(&mut a);
        assert_eq!(clone.get_or_create(&mut b), "generatedAlias1");
    }

    #[test]
    fn test_fresh_generators_are_independent() {
        let first = AliasGenerator::new();
        let second = AliasGenerator::new();
        let mut a = Root::new("A");
        let mut b = Root::new("B");
        assert_eq!(first.get_or_create(&mut a), "generatedAlias0");
        assert_eq!(second.get_or_create(&mut b), "generatedAlias0");
    }
}
