//! Translation of criteria queries into SQL text.
//!
//! [`SqlTranslator`] renders a [`CriteriaQuery`] into a SELECT statement with
//! quoted identifiers, resolving join conditions through the [`Metamodel`].
//! Parameters are not interpolated: inline values become `?` tokens and named
//! parameters stay as `:name` tokens, with a parallel [`ParamSlot`] list
//! recording each token in order. The native count wrapper rewrites those
//! tokens into dialect placeholders and binds them positionally.

use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::debug;

use criteria_rs_core::{CriteriaError, CriteriaResult};

use crate::metamodel::{Attribute, Metamodel, PersistentKind, TypeRef};
use crate::query::criteria::{CriteriaQuery, Fetch, Join, Root, Selection};
use crate::query::predicate::{Lookup, Operand, Predicate};
use crate::value::Value;

/// The SQL dialect of the underlying database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderDialect {
    /// PostgreSQL (`$1`, `$2`, ... placeholders).
    PostgreSQL,
    /// SQLite (`?` placeholders).
    SQLite,
    /// MySQL (`?` placeholders).
    MySQL,
}

impl ProviderDialect {
    /// Returns the positional placeholder for a 1-based parameter position.
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${position}"),
            Self::SQLite | Self::MySQL => "?".to_string(),
        }
    }
}

/// One parameter slot of a translated query, in token order.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSlot {
    /// A named parameter, bound by name at execution time.
    Named(String),
    /// An inline literal lifted out of the predicate.
    Inline(Value),
}

/// The output of translating a query: SQL text plus its parameter slots.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    /// The SQL text, with `?` and `:name` parameter tokens.
    pub sql: String,
    /// The parameter slots, in the order their tokens appear in `sql`.
    pub params: Vec<ParamSlot>,
}

/// Renders criteria queries as SQL using entity metadata.
#[derive(Debug, Clone)]
pub struct SqlTranslator {
    metamodel: Metamodel,
    dialect: ProviderDialect,
}

impl SqlTranslator {
    /// Creates a translator over the given metamodel and dialect.
    pub const fn new(metamodel: Metamodel, dialect: ProviderDialect) -> Self {
        Self { metamodel, dialect }
    }

    /// Returns the dialect this translator targets.
    pub const fn dialect(&self) -> ProviderDialect {
        self.dialect
    }

    /// Returns the metamodel backing this translator.
    pub const fn metamodel(&self) -> &Metamodel {
        &self.metamodel
    }

    /// Translates a query into a SELECT statement.
    ///
    /// # Errors
    ///
    /// Fails when the query has no roots, a root or join lacks an alias,
    /// an entity or attribute is not registered, or a join traverses
    /// something the translator cannot express (a non-association or a
    /// many-to-many without a mapped junction).
    pub fn translate_select(&self, query: &CriteriaQuery) -> CriteriaResult<TranslatedQuery> {
        if query.roots.is_empty() {
            return Err(CriteriaError::TranslationError(
                "query has no roots".to_string(),
            ));
        }

        let aliases = Self::collect_aliases(query)?;
        let default_alias = Self::node_alias(&query.roots[0])?;
        let mut params = Vec::new();

        let mut sql = String::from("SELECT ");
        let count_selection = matches!(
            query.selection.as_deref(),
            Some(Selection::Count { .. })
        );
        // COUNT(DISTINCT ...) carries the distinct itself.
        if query.distinct && !count_selection {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.render_selection(query, default_alias)?);

        sql.push_str(" FROM ");
        for (i, root) in query.roots.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            let entity = self.metamodel.entity_or_err(&root.entity)?;
            let alias = Self::node_alias(root)?;
            let _ = write!(sql, "{} {}", quote(&entity.table), quote(alias));
        }

        for root in &query.roots {
            let alias = Self::node_alias(root)?;
            for join in &root.joins {
                self.render_join(&mut sql, &root.entity, alias, join)?;
            }
            for fetch in &root.fetches {
                self.render_fetch(&mut sql, &root.entity, alias, fetch)?;
            }
        }

        if let Some(predicate) = &query.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&Self::render_predicate(
                predicate,
                default_alias,
                &mut params,
            )?);
        }

        if !query.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            let rendered: Vec<String> = query
                .group_by
                .iter()
                .map(|p| render_path(p, default_alias))
                .collect();
            sql.push_str(&rendered.join(", "));
        }

        if let Some(predicate) = &query.having {
            sql.push_str(" HAVING ");
            sql.push_str(&Self::render_predicate(
                predicate,
                default_alias,
                &mut params,
            )?);
        }

        if !query.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let rendered: Vec<String> = query
                .order_by
                .iter()
                .map(|o| {
                    let path = render_path(&o.path, default_alias);
                    if o.descending {
                        format!("{path} DESC")
                    } else {
                        format!("{path} ASC")
                    }
                })
                .collect();
            sql.push_str(&rendered.join(", "));
        }

        debug!(%sql, params = params.len(), aliases = aliases.len(), "translated query");
        Ok(TranslatedQuery { sql, params })
    }

    fn render_selection(
        &self,
        query: &CriteriaQuery,
        default_alias: &str,
    ) -> CriteriaResult<String> {
        match query.selection.as_deref() {
            None | Some(Selection::Root(_)) => {
                let alias = match query.selection.as_deref() {
                    Some(Selection::Root(alias)) => alias,
                    _ => default_alias,
                };
                Ok(format!("{}.*", quote(alias)))
            }
            Some(Selection::Paths(paths)) => {
                let rendered: Vec<String> = paths
                    .iter()
                    .map(|p| render_path(p, default_alias))
                    .collect();
                Ok(rendered.join(", "))
            }
            Some(Selection::Count { root, distinct }) => {
                let counted = query
                    .roots
                    .iter()
                    .find(|r| r.alias.as_deref() == Some(root))
                    .ok_or_else(|| {
                        CriteriaError::TranslationError(format!(
                            "count selection references unknown root alias '{root}'"
                        ))
                    })?;
                let entity = self.metamodel.entity_or_err(&counted.entity)?;
                let column = format!("{}.{}", quote(root), quote(&entity.pk_column));
                if *distinct {
                    Ok(format!("COUNT(DISTINCT {column})"))
                } else {
                    Ok(format!("COUNT({column})"))
                }
            }
        }
    }

    fn render_join(
        &self,
        sql: &mut String,
        parent_entity: &str,
        parent_alias: &str,
        join: &Join,
    ) -> CriteriaResult<()> {
        let alias = join.alias.as_deref().ok_or_else(|| {
            CriteriaError::TranslationError(format!(
                "join over '{}' has no alias",
                join.attribute
            ))
        })?;
        let (table, on) =
            self.join_condition(parent_entity, parent_alias, &join.attribute, alias)?;
        let _ = write!(
            sql,
            " {} {} {} ON {}",
            join.kind.sql_keyword(),
            quote(&table),
            quote(alias),
            on
        );
        for child in &join.joins {
            self.render_join(sql, &join.entity, alias, child)?;
        }
        Ok(())
    }

    // Fetches carry no join kind; they always render as left joins so eager
    // loading cannot narrow the result set.
    fn render_fetch(
        &self,
        sql: &mut String,
        parent_entity: &str,
        parent_alias: &str,
        fetch: &Fetch,
    ) -> CriteriaResult<()> {
        let alias = fetch.alias.as_deref().ok_or_else(|| {
            CriteriaError::TranslationError(format!(
                "fetch over '{}' has no alias",
                fetch.attribute
            ))
        })?;
        let (table, on) =
            self.join_condition(parent_entity, parent_alias, &fetch.attribute, alias)?;
        let _ = write!(sql, " LEFT JOIN {} {} ON {}", quote(&table), quote(alias), on);
        for child in &fetch.fetches {
            self.render_fetch(sql, &fetch.entity, alias, child)?;
        }
        Ok(())
    }

    /// Resolves the target table and ON condition for traversing an
    /// association attribute.
    fn join_condition(
        &self,
        parent_entity: &str,
        parent_alias: &str,
        attribute: &str,
        child_alias: &str,
    ) -> CriteriaResult<(String, String)> {
        let attr = self.metamodel.attr_or_err(parent_entity, attribute)?;
        let target = match &attr.ty {
            TypeRef::Entity(name) => name,
            TypeRef::Scalar(_) => {
                return Err(CriteriaError::TranslationError(format!(
                    "attribute '{parent_entity}.{attribute}' is not an association"
                )))
            }
        };
        let parent = self.metamodel.entity_or_err(parent_entity)?;
        let child = self.metamodel.entity_or_err(target)?;

        let on = match attr.kind {
            PersistentKind::ManyToOne => {
                let fk = owning_fk(attr);
                format!(
                    "{}.{} = {}.{}",
                    quote(parent_alias),
                    quote(&fk),
                    quote(child_alias),
                    quote(&child.pk_column)
                )
            }
            PersistentKind::OneToOne | PersistentKind::OneToMany => {
                if let Some(inverse) = attr.mapped_by() {
                    // Inverse side: the foreign key lives on the target's
                    // owning attribute.
                    let fk = child
                        .attr(inverse)
                        .map_or_else(|| format!("{inverse}_id"), owning_fk);
                    format!(
                        "{}.{} = {}.{}",
                        quote(child_alias),
                        quote(&fk),
                        quote(parent_alias),
                        quote(&parent.pk_column)
                    )
                } else if attr.kind == PersistentKind::OneToOne {
                    // Owning one-to-one: the foreign key is local.
                    let fk = owning_fk(attr);
                    format!(
                        "{}.{} = {}.{}",
                        quote(parent_alias),
                        quote(&fk),
                        quote(child_alias),
                        quote(&child.pk_column)
                    )
                } else {
                    // Unidirectional one-to-many: conventional foreign key
                    // named after the parent entity.
                    let fk = format!("{}_id", parent_entity.to_lowercase());
                    format!(
                        "{}.{} = {}.{}",
                        quote(child_alias),
                        quote(&fk),
                        quote(parent_alias),
                        quote(&parent.pk_column)
                    )
                }
            }
            PersistentKind::ManyToMany => {
                return Err(CriteriaError::TranslationError(format!(
                    "many-to-many association '{parent_entity}.{attribute}' requires a junction table and cannot be joined directly"
                )))
            }
            _ => {
                return Err(CriteriaError::TranslationError(format!(
                    "attribute '{parent_entity}.{attribute}' is not an association"
                )))
            }
        };

        Ok((child.table.clone(), on))
    }

    fn render_predicate(
        predicate: &Predicate,
        default_alias: &str,
        params: &mut Vec<ParamSlot>,
    ) -> CriteriaResult<String> {
        match predicate {
            Predicate::Filter { path, lookup } => {
                let column = render_path(path, default_alias);
                Self::render_lookup(&column, lookup, params)
            }
            Predicate::And(children) | Predicate::Or(children) => {
                if children.is_empty() {
                    return Err(CriteriaError::TranslationError(
                        "empty conjunction in restriction".to_string(),
                    ));
                }
                let joiner = if matches!(predicate, Predicate::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                let rendered: CriteriaResult<Vec<String>> = children
                    .iter()
                    .map(|c| Self::render_predicate(c, default_alias, params))
                    .collect();
                Ok(format!("({})", rendered?.join(joiner)))
            }
            Predicate::Not(inner) => {
                let rendered = Self::render_predicate(inner, default_alias, params)?;
                Ok(format!("NOT ({rendered})"))
            }
        }
    }

    fn render_lookup(
        column: &str,
        lookup: &Lookup,
        params: &mut Vec<ParamSlot>,
    ) -> CriteriaResult<String> {
        let rendered = match lookup {
            Lookup::Exact(Operand::Value(Value::Null)) => format!("{column} IS NULL"),
            Lookup::Exact(op) => format!("{column} = {}", push_operand(op, params)),
            Lookup::Gt(op) => format!("{column} > {}", push_operand(op, params)),
            Lookup::Gte(op) => format!("{column} >= {}", push_operand(op, params)),
            Lookup::Lt(op) => format!("{column} < {}", push_operand(op, params)),
            Lookup::Lte(op) => format!("{column} <= {}", push_operand(op, params)),
            Lookup::Like(pattern) => {
                params.push(ParamSlot::Inline(Value::String(pattern.clone())));
                format!("{column} LIKE ?")
            }
            Lookup::In(operands) => {
                if operands.is_empty() {
                    // An empty IN list matches nothing.
                    "1 = 0".to_string()
                } else {
                    let tokens: Vec<String> =
                        operands.iter().map(|op| push_operand(op, params)).collect();
                    format!("{column} IN ({})", tokens.join(", "))
                }
            }
            Lookup::Between(low, high) => {
                let low = push_operand(low, params);
                let high = push_operand(high, params);
                format!("{column} BETWEEN {low} AND {high}")
            }
            Lookup::IsNull(true) => format!("{column} IS NULL"),
            Lookup::IsNull(false) => format!("{column} IS NOT NULL"),
        };
        Ok(rendered)
    }

    /// Collects every alias in the query, rejecting duplicates.
    fn collect_aliases(query: &CriteriaQuery) -> CriteriaResult<HashMap<String, String>> {
        fn insert(
            aliases: &mut HashMap<String, String>,
            alias: Option<&str>,
            entity: &str,
        ) -> CriteriaResult<()> {
            if let Some(alias) = alias {
                if aliases.insert(alias.to_string(), entity.to_string()).is_some() {
                    return Err(CriteriaError::TranslationError(format!(
                        "alias '{alias}' is used more than once"
                    )));
                }
            }
            Ok(())
        }

        fn walk_join(aliases: &mut HashMap<String, String>, join: &Join) -> CriteriaResult<()> {
            insert(aliases, join.alias.as_deref(), &join.entity)?;
            join.joins.iter().try_for_each(|j| walk_join(aliases, j))
        }

        fn walk_fetch(aliases: &mut HashMap<String, String>, fetch: &Fetch) -> CriteriaResult<()> {
            insert(aliases, fetch.alias.as_deref(), &fetch.entity)?;
            fetch.fetches.iter().try_for_each(|f| walk_fetch(aliases, f))
        }

        let mut aliases = HashMap::new();
        for root in &query.roots {
            insert(&mut aliases, root.alias.as_deref(), &root.entity)?;
            root.joins.iter().try_for_each(|j| walk_join(&mut aliases, j))?;
            root.fetches
                .iter()
                .try_for_each(|f| walk_fetch(&mut aliases, f))?;
        }
        Ok(aliases)
    }

    fn node_alias(root: &Root) -> CriteriaResult<&str> {
        root.alias.as_deref().ok_or_else(|| {
            CriteriaError::TranslationError(format!("root '{}' has no alias", root.entity))
        })
    }
}

/// The owning-side foreign-key column: the declared join column or the
/// `{attribute}_id` convention.
fn owning_fk(attr: &Attribute) -> String {
    attr.join_column
        .clone()
        .unwrap_or_else(|| format!("{}_id", attr.name))
}

fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}

/// Renders a path as a quoted column reference. A bare attribute resolves
/// against the default root alias.
fn render_path(path: &str, default_alias: &str) -> String {
    match path.split_once('.') {
        Some((alias, column)) => format!("{}.{}", quote(alias), quote(column)),
        None => format!("{}.{}", quote(default_alias), quote(path)),
    }
}

fn push_operand(op: &Operand, params: &mut Vec<ParamSlot>) -> String {
    match op {
        Operand::Value(v) => {
            params.push(ParamSlot::Inline(v.clone()));
            "?".to_string()
        }
        Operand::Param(name) => {
            params.push(ParamSlot::Named(name.clone()));
            format!(":{name}")
        }
    }
}
