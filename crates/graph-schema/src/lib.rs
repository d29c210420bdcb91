//! The resolved, immutable model of a declared property graph schema.
//!
//! A [`SchemaDeclaration`] is resolved once by [`Schema::build`] into flat arenas of records
//! addressed by id newtypes. Consumers navigate the model with [`Walker`]s, which pair an id with
//! a reference to the schema, so cyclic entity graphs need no eager recursive construction: a
//! relationship stores the id of its target and the walker resolves it on access.
//!
//! The schema is never mutated after it is built and can be shared between threads freely.

mod attribute;
mod authorization;
mod builder;
pub mod declaration;
mod entity;
mod ids;
mod names;
mod relationship;
mod walkers;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

pub use attribute::{AttributeOwner, AttributeRecord, AttributeType, Capabilities};
pub use authorization::{
    AuthenticationRule, AuthorizationOperation, AuthorizationRule, Operations, RuleMode, ValidatePhase,
};
pub use builder::BuildError;
pub use declaration::{Autogenerate, AuthorizationWhere, SchemaDeclaration};
pub use entity::{
    CapabilityIndex, ConcreteEntityRecord, FulltextIndex, InterfaceEntityRecord, Limit, UnionEntityRecord,
    VectorIndex,
};
pub use ids::*;
pub use names::{EntityNames, RelationshipNames};
pub use relationship::{
    NestedOperation, NestedOperations, QueryDirection, RelationshipDeclarationRecord, RelationshipDirection,
    RelationshipPropertiesRecord, RelationshipRecord,
};
pub use walkers::*;

#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) concrete_entities: Vec<ConcreteEntityRecord>,
    pub(crate) interface_entities: Vec<InterfaceEntityRecord>,
    pub(crate) union_entities: Vec<UnionEntityRecord>,
    pub(crate) attributes: Vec<AttributeRecord>,
    pub(crate) relationships: Vec<RelationshipRecord>,
    pub(crate) relationship_declarations: Vec<RelationshipDeclarationRecord>,
    pub(crate) relationship_properties: Vec<RelationshipPropertiesRecord>,
    pub(crate) entities_by_name: HashMap<String, EntityId>,
    pub(crate) root_fields: HashMap<String, RootField>,
    pub(crate) authentication: Option<AuthenticationRule>,
}

/// What a root query or mutation field does, and on which entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootField {
    pub kind: RootFieldKind,
    pub entity: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootFieldKind {
    Read,
    Connection,
    Aggregate,
    Create,
    Update,
    Delete,
    /// A full-text index probe, by index name.
    Fulltext(String),
    /// A vector index probe, by index name.
    Vector(String),
}

impl Schema {
    pub fn build(declaration: &SchemaDeclaration) -> Result<Self, BuildError> {
        builder::build(declaration)
    }

    pub fn from_toml_str(input: &str) -> Result<Self, BuildError> {
        let declaration =
            SchemaDeclaration::from_toml_str(input).map_err(|err| BuildError::InvalidDeclaration(err.to_string()))?;

        Self::build(&declaration)
    }

    pub fn walk<Id>(&self, id: Id) -> Walker<'_, Id> {
        Walker { id, schema: self }
    }

    pub fn entity(&self, id: EntityId) -> EntityWalker<'_> {
        match id {
            EntityId::Concrete(id) => EntityWalker::Concrete(self.walk(id)),
            EntityId::Interface(id) => EntityWalker::Interface(self.walk(id)),
            EntityId::Union(id) => EntityWalker::Union(self.walk(id)),
        }
    }

    pub fn find_entity(&self, name: &str) -> Option<EntityWalker<'_>> {
        self.entities_by_name.get(name).map(|id| self.entity(*id))
    }

    pub fn find_concrete_entity(&self, name: &str) -> Option<ConcreteEntityWalker<'_>> {
        self.find_entity(name).and_then(EntityWalker::as_concrete)
    }

    pub fn concrete_entities(&self) -> impl ExactSizeIterator<Item = ConcreteEntityWalker<'_>> + '_ {
        (0..self.concrete_entities.len()).map(|id| self.walk(ConcreteEntityId::from(id)))
    }

    pub fn interface_entities(&self) -> impl ExactSizeIterator<Item = InterfaceEntityWalker<'_>> + '_ {
        (0..self.interface_entities.len()).map(|id| self.walk(InterfaceEntityId::from(id)))
    }

    pub fn union_entities(&self) -> impl ExactSizeIterator<Item = UnionEntityWalker<'_>> + '_ {
        (0..self.union_entities.len()).map(|id| self.walk(UnionEntityId::from(id)))
    }

    /// Resolves a root query or mutation field name, such as `moviesConnection` or
    /// `createMovies`.
    pub fn root_field(&self, name: &str) -> Option<&RootField> {
        self.root_fields.get(name)
    }

    /// Authentication required by the schema for every entity.
    pub fn authentication(&self) -> Option<&AuthenticationRule> {
        self.authentication.as_ref()
    }
}
