//! String-level helpers for query text.
//!
//! These operate on already-rendered query strings rather than the criteria
//! AST. They are best-effort by nature: rewriting happens around the first
//! `FROM` keyword, so a query whose select list itself contains `from` (for
//! example inside a string literal) will not rewrite cleanly. Callers that
//! hold the structured query should prefer the AST-level transformers.

use once_cell::sync::Lazy;
use regex::Regex;

use criteria_rs_core::{CriteriaError, CriteriaResult};

static SELECT_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^.*?\bfrom\b").expect("valid regex"));

static FROM_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\bfrom\b.*$").expect("valid regex"));

static ROOT_ALIAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfrom\s+\S+\s+(?:as\s+)?(\w+)").expect("valid regex"));

/// Rewrites a select query string into a count query by replacing everything
/// up to and including the first `FROM` with `select count(*) from`.
///
/// # Errors
///
/// Fails when the string contains no `FROM` clause.
pub fn count_query_string(query: &str) -> CriteriaResult<String> {
    if !SELECT_HEAD.is_match(query) {
        return Err(CriteriaError::TranslationError(format!(
            "query string has no FROM clause: '{query}'"
        )));
    }
    Ok(SELECT_HEAD
        .replace(query, "select count(*) from")
        .into_owned())
}

/// Extracts the alias of the first root in a query string's `FROM` clause.
/// The optional `AS` keyword is accepted.
///
/// # Errors
///
/// Fails when no aliased root can be found.
pub fn root_alias(query: &str) -> CriteriaResult<String> {
    ROOT_ALIAS
        .captures(query)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            CriteriaError::TranslationError(format!(
                "could not determine the root alias of '{query}'"
            ))
        })
}

/// Rewrites a select query string so it selects only the root's primary key
/// column, keeping the `FROM` clause onward intact.
///
/// # Errors
///
/// Fails when the root alias or the `FROM` clause cannot be found.
pub fn pk_query(query: &str, pk_column: &str) -> CriteriaResult<String> {
    let alias = root_alias(query)?;
    let tail = FROM_TAIL.find(query).ok_or_else(|| {
        CriteriaError::TranslationError(format!("query string has no FROM clause: '{query}'"))
    })?;
    Ok(format!("select {alias}.{pk_column} {}", tail.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY: &str = "select o from Order o where o.total > 100 order by o.total";

    // ── count rewriting ──────────────────────────────────────────────

    #[test]
    fn test_count_query_string() {
        assert_eq!(
            count_query_string(QUERY).unwrap(),
            "select count(*) from Order o where o.total > 100 order by o.total"
        );
    }

    #[test]
    fn test_count_query_string_case_insensitive() {
        assert_eq!(
            count_query_string("SELECT o FROM Order o").unwrap(),
            "select count(*) from Order o"
        );
    }

    #[test]
    fn test_count_query_string_rewrites_first_from_only() {
        let q = "select o from Order o where o.id in (select i.order_id from OrderItem i)";
        assert_eq!(
            count_query_string(q).unwrap(),
            "select count(*) from Order o where o.id in (select i.order_id from OrderItem i)"
        );
    }

    #[test]
    fn test_count_query_string_without_from() {
        assert!(count_query_string("select 1").is_err());
    }

    // ── root alias ───────────────────────────────────────────────────

    #[test]
    fn test_root_alias() {
        assert_eq!(root_alias(QUERY).unwrap(), "o");
    }

    #[test]
    fn test_root_alias_with_as_keyword() {
        assert_eq!(root_alias("select x from Order as ord").unwrap(), "ord");
    }

    #[test]
    fn test_root_alias_missing() {
        assert!(root_alias("not a query").is_err());
    }

    // ── primary-key rewriting ────────────────────────────────────────

    #[test]
    fn test_pk_query() {
        assert_eq!(
            pk_query(QUERY, "id").unwrap(),
            "select o.id from Order o where o.total > 100 order by o.total"
        );
    }

    #[test]
    fn test_pk_query_custom_pk() {
        assert_eq!(
            pk_query("select c from Customer c", "customer_no").unwrap(),
            "select c.customer_no from Customer c"
        );
    }

    #[test]
    fn test_pk_query_without_from() {
        assert!(pk_query("select 1", "id").is_err());
    }
}
