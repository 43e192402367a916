//! The criteria query AST: roots, joins, fetches, and query-level metadata.
//!
//! A [`CriteriaQuery`] is a structured query over one or more [`Root`]s, each
//! carrying a tree of [`Join`]s and a parallel tree of [`Fetch`]es. The query
//! also holds the restriction ([`Predicate`]), grouping, having, ordering,
//! projection, and distinct flag. Predicates, the having clause, and the
//! selection are stored behind [`Arc`] so derived queries can share them by
//! reference rather than deep-copying — the transformation helpers only
//! reconstruct the root/join/fetch shape.

use std::sync::Arc;

use super::predicate::Predicate;

/// The declared result type of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultType {
    /// Rows of the named entity type.
    Entity(String),
    /// A single 64-bit count, as produced by the row-count transformer.
    Long,
}

/// A node that can carry a query-scoped alias.
///
/// Implemented by [`Root`], [`Join`], and [`Fetch`]. Once an alias is set it
/// is never reassigned by the helpers in this crate.
pub trait Aliased {
    /// Returns the node's alias, if one has been assigned.
    fn alias(&self) -> Option<&str>;

    /// Assigns the node's alias.
    fn set_alias(&mut self, alias: String);
}

/// SQL join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
    /// RIGHT OUTER JOIN.
    Right,
}

impl JoinKind {
    /// Returns the SQL keyword for this join kind.
    pub const fn sql_keyword(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }
}

/// A column ordering entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The path to order by (`alias.attribute` or bare attribute).
    pub path: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl OrderBy {
    /// Creates an ascending order.
    pub fn asc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            descending: false,
        }
    }

    /// Creates a descending order.
    pub fn desc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            descending: true,
        }
    }
}

/// The projection of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// All columns of the root with the given alias.
    Root(String),
    /// Specific paths.
    Paths(Vec<String>),
    /// `count(root)` over the root with the given alias, optionally distinct.
    Count {
        /// Alias of the root being counted.
        root: String,
        /// Whether to count distinct rows.
        distinct: bool,
    },
}

/// A typed association edge from a Root or Join to another entity.
#[derive(Debug, Clone)]
pub struct Join {
    /// The attribute on the parent entity this join traverses.
    pub attribute: String,
    /// The target entity type name.
    pub entity: String,
    /// The join kind.
    pub kind: JoinKind,
    /// The node's alias.
    pub alias: Option<String>,
    /// Child joins hanging off this join.
    pub joins: Vec<Join>,
}

impl Join {
    pub(crate) fn new(
        attribute: impl Into<String>,
        entity: impl Into<String>,
        kind: JoinKind,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            entity: entity.into(),
            kind,
            alias: None,
            joins: Vec::new(),
        }
    }

    /// Adds a child join under this join and returns a reference to it.
    pub fn join(
        &mut self,
        attribute: impl Into<String>,
        entity: impl Into<String>,
        kind: JoinKind,
    ) -> &mut Join {
        let idx = self.joins.len();
        self.joins.push(Join::new(attribute, entity, kind));
        &mut self.joins[idx]
    }
}

impl Aliased for Join {
    fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    fn set_alias(&mut self, alias: String) {
        self.alias = Some(alias);
    }
}

/// An eager-loading association edge.
///
/// Structurally identical to [`Join`] but signals fetch semantics and carries
/// no join kind; the SQL translator renders fetches as left joins.
#[derive(Debug, Clone)]
pub struct Fetch {
    /// The attribute on the parent entity this fetch traverses.
    pub attribute: String,
    /// The target entity type name.
    pub entity: String,
    /// The node's alias.
    pub alias: Option<String>,
    /// Child fetches hanging off this fetch.
    pub fetches: Vec<Fetch>,
}

impl Fetch {
    pub(crate) fn new(attribute: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            entity: entity.into(),
            alias: None,
            fetches: Vec::new(),
        }
    }

    /// Adds a child fetch under this fetch and returns a reference to it.
    pub fn fetch(
        &mut self,
        attribute: impl Into<String>,
        entity: impl Into<String>,
    ) -> &mut Fetch {
        let idx = self.fetches.len();
        self.fetches.push(Fetch::new(attribute, entity));
        &mut self.fetches[idx]
    }
}

impl Aliased for Fetch {
    fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    fn set_alias(&mut self, alias: String) {
        self.alias = Some(alias);
    }
}

/// A query's top-level entity reference.
#[derive(Debug, Clone)]
pub struct Root {
    /// The entity type name.
    pub entity: String,
    /// The node's alias.
    pub alias: Option<String>,
    /// The join tree rooted at this entity.
    pub joins: Vec<Join>,
    /// The fetch tree rooted at this entity.
    pub fetches: Vec<Fetch>,
}

impl Root {
    pub(crate) fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            alias: None,
            joins: Vec::new(),
            fetches: Vec::new(),
        }
    }

    /// Adds a join under this root and returns a reference to it.
    pub fn join(
        &mut self,
        attribute: impl Into<String>,
        entity: impl Into<String>,
        kind: JoinKind,
    ) -> &mut Join {
        let idx = self.joins.len();
        self.joins.push(Join::new(attribute, entity, kind));
        &mut self.joins[idx]
    }

    /// Adds a fetch under this root and returns a reference to it.
    pub fn fetch(
        &mut self,
        attribute: impl Into<String>,
        entity: impl Into<String>,
    ) -> &mut Fetch {
        let idx = self.fetches.len();
        self.fetches.push(Fetch::new(attribute, entity));
        &mut self.fetches[idx]
    }
}

impl Aliased for Root {
    fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    fn set_alias(&mut self, alias: String) {
        self.alias = Some(alias);
    }
}

/// A structured query over one or more roots.
///
/// Queries are owned by the caller for their full lifecycle; the
/// transformation helpers in this crate read them and build new ones but
/// never mutate a source query.
#[derive(Debug, Clone)]
pub struct CriteriaQuery {
    /// The declared result type.
    pub result: ResultType,
    /// The query roots.
    pub roots: Vec<Root>,
    /// The restriction (where clause), shared by reference across clones.
    pub where_clause: Option<Arc<Predicate>>,
    /// Grouping paths.
    pub group_by: Vec<String>,
    /// The group restriction (having clause), shared by reference.
    pub having: Option<Arc<Predicate>>,
    /// Ordering entries.
    pub order_by: Vec<OrderBy>,
    /// The projection, shared by reference across clones.
    pub selection: Option<Arc<Selection>>,
    /// DISTINCT flag.
    pub distinct: bool,
}

impl CriteriaQuery {
    /// Creates a new query whose result type is the given entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self::with_result_type(ResultType::Entity(entity.into()))
    }

    /// Creates a new query with an explicit result type.
    pub fn with_result_type(result: ResultType) -> Self {
        Self {
            result,
            roots: Vec::new(),
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            selection: None,
            distinct: false,
        }
    }

    /// Adds a root of the given entity type and returns a reference to it.
    pub fn add_root(&mut self, entity: impl Into<String>) -> &mut Root {
        let idx = self.roots.len();
        self.roots.push(Root::new(entity));
        &mut self.roots[idx]
    }

    /// Returns the entity name of the declared result type, if any.
    pub fn result_entity(&self) -> Option<&str> {
        match &self.result {
            ResultType::Entity(name) => Some(name),
            ResultType::Long => None,
        }
    }

    /// Finds the root matching the query's own declared result type.
    pub fn find_result_root(&self) -> Option<&Root> {
        self.result_entity().and_then(|e| self.find_root(e))
    }

    /// Finds the first root of the given entity type, or `None`.
    ///
    /// Absence is an ordinary outcome here; callers that require a root
    /// should check before use.
    pub fn find_root(&self, entity: &str) -> Option<&Root> {
        self.roots.iter().find(|r| r.entity == entity)
    }

    /// Returns every root of the given entity type.
    pub fn roots_of(&self, entity: &str) -> Vec<&Root> {
        self.roots.iter().filter(|r| r.entity == entity).collect()
    }

    /// Finds the root of the given entity type, creating one if absent.
    pub fn find_or_create_root(&mut self, entity: &str) -> &mut Root {
        if let Some(idx) = self.roots.iter().position(|r| r.entity == entity) {
            return &mut self.roots[idx];
        }
        self.add_root(entity)
    }

    /// Finds a direct join of `join_entity` under the root of `root_entity`.
    ///
    /// When several direct joins target the same entity, the last one wins;
    /// callers with ambiguous graphs should walk `Root::joins` themselves.
    pub fn find_joined_type(&self, root_entity: &str, join_entity: &str) -> Option<&Join> {
        let root = self.find_root(root_entity)?;
        let mut found = None;
        for join in &root.joins {
            if join.entity == join_entity {
                found = Some(join);
            }
        }
        found
    }
}
