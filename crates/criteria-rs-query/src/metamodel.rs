//! Entity metamodel: entity types, attributes, and persistence-kind
//! classification.
//!
//! The [`Metamodel`] is a registry of [`EntityType`] descriptors built once by
//! the host application. Each entity declares its [`Attribute`]s: persistence
//! kind (basic, association, collection), declared type, the inverse-side
//! `mapped_by` name for bidirectional associations, and the owning-side join
//! column used by the SQL translator.
//!
//! Association metadata is declarative: the inverse-side name is a plain field
//! populated at registration rather than something re-derived per call.

use std::collections::HashMap;

use criteria_rs_core::{CriteriaError, CriteriaResult};

/// The scalar (non-entity) types an attribute can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating-point number.
    Float,
    /// Fixed-precision decimal.
    Decimal,
    /// UTF-8 text.
    Text,
    /// Date without time.
    Date,
    /// Date and time.
    DateTime,
    /// UUID.
    Uuid,
    /// JSON document.
    Json,
}

/// The declared type of an attribute: another entity or a scalar.
///
/// For collection-valued attributes this is the *element* (bindable) type,
/// so type matching is uniform across singular and collection attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A reference to a registered entity type, by name.
    Entity(String),
    /// A scalar value type.
    Scalar(ScalarKind),
}

impl TypeRef {
    /// Creates an entity type reference.
    pub fn entity(name: impl Into<String>) -> Self {
        Self::Entity(name.into())
    }
}

/// A filter over attribute types, used by
/// [`EntityType::attributes_of_kind_matching`].
///
/// [`TypeFilter::Any`] is permissive and matches every type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeFilter {
    /// Matches any type.
    #[default]
    Any,
    /// Matches the named entity type.
    Entity(String),
    /// Matches the given scalar kind.
    Scalar(ScalarKind),
}

impl TypeFilter {
    /// Returns `true` if the given type passes this filter.
    pub fn matches(&self, ty: &TypeRef) -> bool {
        match self {
            Self::Any => true,
            Self::Entity(name) => matches!(ty, TypeRef::Entity(e) if e == name),
            Self::Scalar(kind) => matches!(ty, TypeRef::Scalar(k) if k == kind),
        }
    }
}

/// The persistence kind of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistentKind {
    /// A plain scalar column.
    Basic,
    /// An embedded value object flattened into the owning table.
    Embedded,
    /// A one-to-one association.
    OneToOne,
    /// A one-to-many association (collection-valued).
    OneToMany,
    /// A many-to-one association.
    ManyToOne,
    /// A many-to-many association (collection-valued).
    ManyToMany,
    /// A collection of scalar elements.
    ElementCollection,
}

impl PersistentKind {
    /// Returns `true` for collection-valued kinds.
    pub const fn is_collection(&self) -> bool {
        matches!(
            self,
            Self::OneToMany | Self::ManyToMany | Self::ElementCollection
        )
    }

    /// Returns `true` for entity-association kinds.
    pub const fn is_association(&self) -> bool {
        matches!(
            self,
            Self::OneToOne | Self::OneToMany | Self::ManyToOne | Self::ManyToMany
        )
    }

    /// Returns `true` for association kinds that may declare an inverse side.
    ///
    /// Many-to-one is always the owning side and never carries an inverse
    /// name.
    pub const fn may_have_inverse(&self) -> bool {
        matches!(self, Self::OneToOne | Self::OneToMany | Self::ManyToMany)
    }
}

/// Metadata describing a single attribute of an entity type.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,
    /// The persistence kind.
    pub kind: PersistentKind,
    /// The declared type; the element type for collection-valued attributes.
    pub ty: TypeRef,
    /// The inverse-side property name for bidirectional associations.
    ///
    /// May be `Some("")` when the declaring side left it empty; use
    /// [`Attribute::mapped_by`] for the normalized view.
    pub mapped_by_name: Option<String>,
    /// The foreign-key column on the owning side, if this side owns it.
    pub join_column: Option<String>,
}

impl Attribute {
    /// Creates a basic scalar attribute.
    pub fn basic(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, PersistentKind::Basic, TypeRef::Scalar(kind))
    }

    /// Creates an embedded attribute of the given value-object type.
    pub fn embedded(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, PersistentKind::Embedded, TypeRef::Entity(entity.into()))
    }

    /// Creates a one-to-one association to the given entity.
    pub fn one_to_one(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, PersistentKind::OneToOne, TypeRef::Entity(entity.into()))
    }

    /// Creates a one-to-many association; `entity` is the element type.
    pub fn one_to_many(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, PersistentKind::OneToMany, TypeRef::Entity(entity.into()))
    }

    /// Creates a many-to-one association to the given entity.
    pub fn many_to_one(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, PersistentKind::ManyToOne, TypeRef::Entity(entity.into()))
    }

    /// Creates a many-to-many association; `entity` is the element type.
    pub fn many_to_many(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, PersistentKind::ManyToMany, TypeRef::Entity(entity.into()))
    }

    /// Creates a collection of scalar elements.
    pub fn element_collection(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(
            name,
            PersistentKind::ElementCollection,
            TypeRef::Scalar(kind),
        )
    }

    fn new(name: impl Into<String>, kind: PersistentKind, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            mapped_by_name: None,
            join_column: None,
        }
    }

    /// Declares the inverse-side property name for this association.
    #[must_use]
    pub fn mapped_by_attr(mut self, name: impl Into<String>) -> Self {
        self.mapped_by_name = Some(name.into());
        self
    }

    /// Sets the owning-side foreign-key column name.
    #[must_use]
    pub fn join_column(mut self, column: impl Into<String>) -> Self {
        self.join_column = Some(column.into());
        self
    }

    /// Returns `true` for collection-valued attributes.
    pub const fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }

    /// Returns `true` for entity-association attributes.
    pub const fn is_association(&self) -> bool {
        self.kind.is_association()
    }

    /// Returns the inverse-side property name of a bidirectional association.
    ///
    /// Returns `None` when the attribute is not an association, when the
    /// association kind cannot declare an inverse, when no inverse name was
    /// declared, or when the declared name is empty. These conditions are
    /// deliberately collapsed into a single outcome.
    pub fn mapped_by(&self) -> Option<&str> {
        if !self.kind.may_have_inverse() {
            return None;
        }
        match self.mapped_by_name.as_deref() {
            Some("") | None => None,
            other => other,
        }
    }

    /// Returns `true` if the declared type, or the element type for
    /// collections, passes the given filter.
    pub fn is_type_or_element_type(&self, filter: &TypeFilter) -> bool {
        // Collections store their element type directly, so one check covers
        // both cases.
        filter.matches(&self.ty)
    }
}

/// Metadata about an entity type: its table mapping and attributes.
#[derive(Debug, Clone)]
pub struct EntityType {
    /// The entity name (e.g. "Order").
    pub name: String,
    /// The database table name.
    pub table: String,
    /// The primary-key column name.
    pub pk_column: String,
    /// The declared attributes.
    pub attributes: Vec<Attribute>,
}

impl EntityType {
    /// Creates a new entity type with the default `"id"` primary key.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            pk_column: "id".to_string(),
            attributes: Vec::new(),
        }
    }

    /// Sets the primary-key column name.
    #[must_use]
    pub fn pk_column(mut self, column: impl Into<String>) -> Self {
        self.pk_column = column.into();
        self
    }

    /// Adds an attribute to this entity type.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Looks up an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns all attributes of the given persistence kind.
    pub fn attributes_of_kind(&self, kind: PersistentKind) -> Vec<&Attribute> {
        self.attributes_of_kind_matching(kind, &TypeFilter::Any)
    }

    /// Returns all attributes of the given persistence kind whose declared
    /// type (or element type, for collections) passes the filter.
    pub fn attributes_of_kind_matching(
        &self,
        kind: PersistentKind,
        filter: &TypeFilter,
    ) -> Vec<&Attribute> {
        self.attributes
            .iter()
            .filter(|a| a.kind == kind && a.is_type_or_element_type(filter))
            .collect()
    }
}

/// A registry of entity types, keyed by entity name.
#[derive(Debug, Clone, Default)]
pub struct Metamodel {
    entities: HashMap<String, EntityType>,
}

impl Metamodel {
    /// Creates an empty metamodel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type, replacing any previous registration of the
    /// same name.
    pub fn register(&mut self, entity: EntityType) {
        self.entities.insert(entity.name.clone(), entity);
    }

    /// Looks up an entity type by name.
    pub fn entity(&self, name: &str) -> Option<&EntityType> {
        self.entities.get(name)
    }

    /// Looks up an entity type by name, failing with
    /// [`CriteriaError::UnknownEntity`] if absent.
    pub fn entity_or_err(&self, name: &str) -> CriteriaResult<&EntityType> {
        self.entity(name)
            .ok_or_else(|| CriteriaError::UnknownEntity(name.to_string()))
    }

    /// Looks up an attribute on an entity, failing if either is unknown.
    pub fn attr_or_err(&self, entity: &str, attribute: &str) -> CriteriaResult<&Attribute> {
        self.entity_or_err(entity)?
            .attr(attribute)
            .ok_or_else(|| CriteriaError::UnknownAttribute {
                entity: entity.to_string(),
                attribute: attribute.to_string(),
            })
    }
}
