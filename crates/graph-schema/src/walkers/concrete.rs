use super::{AttributeWalker, InterfaceEntityWalker, RelationshipWalker, UnionEntityWalker, Walker};
use crate::{
    AuthenticationRule, AuthorizationRule, ConcreteEntityId, EntityId, EntityNames, FulltextIndex, Limit, VectorIndex,
};

/// A node type with storage labels.
pub type ConcreteEntityWalker<'a> = Walker<'a, ConcreteEntityId>;

impl<'a> ConcreteEntityWalker<'a> {
    pub fn name(self) -> &'a str {
        &self.get().name
    }

    /// The labels every stored node of this entity carries.
    pub fn labels(self) -> &'a [String] {
        &self.get().labels
    }

    pub fn names(self) -> &'a EntityNames {
        &self.get().names
    }

    pub fn attributes(self) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a {
        self.get().attributes.iter().map(move |id| self.walk(id))
    }

    pub fn find_attribute(self, name: &str) -> Option<AttributeWalker<'a>> {
        self.attributes().find(|attribute| attribute.name() == name)
    }

    pub fn relationships(self) -> impl ExactSizeIterator<Item = RelationshipWalker<'a>> + 'a {
        self.get().relationships.iter().map(move |id| self.walk(id))
    }

    pub fn find_relationship(self, name: &str) -> Option<RelationshipWalker<'a>> {
        self.relationships().find(|relationship| relationship.name() == name)
    }

    pub fn interfaces(self) -> impl ExactSizeIterator<Item = InterfaceEntityWalker<'a>> + 'a {
        self.get().interfaces.iter().map(move |id| self.walk(*id))
    }

    pub fn unions(self) -> impl ExactSizeIterator<Item = UnionEntityWalker<'a>> + 'a {
        self.get().unions.iter().map(move |id| self.walk(*id))
    }

    /// Whether this entity is the entity, implements it or belongs to it.
    pub fn is_part_of(self, entity: EntityId) -> bool {
        match entity {
            EntityId::Concrete(id) => id == self.id,
            EntityId::Interface(id) => self.get().interfaces.contains(&id),
            EntityId::Union(id) => self.get().unions.contains(&id),
        }
    }

    pub fn sortable_attributes(self) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a {
        self.attributes_of(&self.get().capability_index.sortable)
    }

    pub fn filterable_attributes(self) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a {
        self.attributes_of(&self.get().capability_index.filterable)
    }

    pub fn aggregable_attributes(self) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a {
        self.attributes_of(&self.get().capability_index.aggregable)
    }

    pub fn unique_attributes(self) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a {
        self.attributes_of(&self.get().capability_index.unique)
    }

    pub fn creatable_attributes(self) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a {
        self.attributes_of(&self.get().capability_index.creatable)
    }

    pub fn updatable_attributes(self) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a {
        self.attributes_of(&self.get().capability_index.updatable)
    }

    pub fn global_id_attribute(self) -> Option<AttributeWalker<'a>> {
        self.get().capability_index.global_id.map(|id| self.walk(id))
    }

    /// Attributes the store fills in itself, such as generated ids and timestamps.
    pub fn autogenerated_attributes(self) -> impl Iterator<Item = AttributeWalker<'a>> + 'a {
        self.attributes().filter(|attribute| attribute.autogenerate().is_some())
    }

    pub fn authorization(self) -> &'a [AuthorizationRule] {
        &self.get().authorization
    }

    pub fn authentication(self) -> Option<&'a AuthenticationRule> {
        self.get().authentication.as_ref()
    }

    pub fn fulltext_indexes(self) -> &'a [FulltextIndex] {
        &self.get().fulltext_indexes
    }

    pub fn find_fulltext_index(self, name: &str) -> Option<&'a FulltextIndex> {
        self.fulltext_indexes().iter().find(|index| index.name == name)
    }

    pub fn vector_indexes(self) -> &'a [VectorIndex] {
        &self.get().vector_indexes
    }

    pub fn find_vector_index(self, name: &str) -> Option<&'a VectorIndex> {
        self.vector_indexes().iter().find(|index| index.name == name)
    }

    pub fn limit(self) -> Option<Limit> {
        self.get().limit
    }
}
