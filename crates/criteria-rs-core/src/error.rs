//! Core error types for the criteria-rs query helpers.
//!
//! This module provides the [`CriteriaError`] enum covering metamodel lookup
//! failures, query transformation errors, and the translation errors raised
//! by the native count fallback.

use thiserror::Error;

/// The primary error type for the criteria-rs helpers.
///
/// Most helpers are pass-through operations that cannot fail; the variants
/// here cover the places where a derived query genuinely cannot be built:
/// metamodel lookups against unknown names, root resolution in the count-query
/// builder, and the SQL translation boundary.
#[derive(Error, Debug)]
pub enum CriteriaError {
    // ── Metamodel errors ─────────────────────────────────────────────

    /// The named entity type is not registered in the metamodel.
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    /// The named attribute does not exist on the entity type.
    #[error("Unknown attribute '{attribute}' on entity '{entity}'")]
    UnknownAttribute {
        /// The entity type that was inspected.
        entity: String,
        /// The attribute name that was not found.
        attribute: String,
    },

    // ── Transformation errors ────────────────────────────────────────

    /// No root of the query's declared result type exists in the query.
    #[error("No root of type '{0}' in query")]
    MissingRoot(String),

    /// More than one root matches the query's declared result type, so the
    /// count selection cannot be resolved unambiguously.
    #[error("Multiple roots of type '{0}' in query; count root is ambiguous")]
    AmbiguousRoot(String),

    /// The source query has no entity result type to count over.
    #[error("Query has no entity result type: {0}")]
    UnsupportedResultType(String),

    // ── Translation errors ───────────────────────────────────────────

    /// The query cannot be rendered to SQL by the native fallback.
    #[error("Translation error: {0}")]
    TranslationError(String),

    /// A named parameter referenced by the query was not supplied.
    #[error("Missing value for named parameter '{0}'")]
    MissingParameter(String),
}

/// A convenience type alias for `Result<T, CriteriaError>`.
pub type CriteriaResult<T> = Result<T, CriteriaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CriteriaError::UnknownEntity("Order".into());
        assert_eq!(err.to_string(), "Unknown entity type: Order");
    }

    #[test]
    fn test_unknown_attribute_display() {
        let err = CriteriaError::UnknownAttribute {
            entity: "Order".into(),
            attribute: "items".into(),
        };
        assert_eq!(err.to_string(), "Unknown attribute 'items' on entity 'Order'");
    }

    #[test]
    fn test_missing_root_display() {
        let err = CriteriaError::MissingRoot("Customer".into());
        assert!(err.to_string().contains("Customer"));
    }

    #[test]
    fn test_missing_parameter_display() {
        let err = CriteriaError::MissingParameter("min_total".into());
        assert_eq!(
            err.to_string(),
            "Missing value for named parameter 'min_total'"
        );
    }
}
