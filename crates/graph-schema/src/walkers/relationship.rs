use super::{AttributeWalker, ConcreteEntityWalker, EntityWalker, RelationshipDeclarationWalker, Walker};
use crate::{
    AuthenticationRule, NestedOperations, QueryDirection, RelationshipDirection, RelationshipId, RelationshipNames,
    RelationshipPropertiesId,
};

/// A typed edge from a node to another entity.
pub type RelationshipWalker<'a> = Walker<'a, RelationshipId>;

impl<'a> RelationshipWalker<'a> {
    pub fn name(self) -> &'a str {
        &self.get().name
    }

    pub fn source(self) -> ConcreteEntityWalker<'a> {
        self.walk(self.get().source)
    }

    /// The entity at the other end, resolved on access.
    pub fn target(self) -> EntityWalker<'a> {
        self.schema.entity(self.get().target)
    }

    /// The stored edge type.
    pub fn edge_type(self) -> &'a str {
        &self.get().edge_type
    }

    pub fn direction(self) -> RelationshipDirection {
        self.get().direction
    }

    pub fn query_direction(self) -> QueryDirection {
        self.get().query_direction
    }

    pub fn is_list(self) -> bool {
        self.get().list
    }

    pub fn is_required(self) -> bool {
        self.get().required
    }

    pub fn nested_operations(self) -> NestedOperations {
        self.get().nested_operations
    }

    pub fn allows(self, operation: NestedOperations) -> bool {
        self.nested_operations().contains(operation)
    }

    /// Whether the `<field>Aggregate` field exists.
    pub fn is_aggregable(self) -> bool {
        self.get().aggregate
    }

    pub fn properties(self) -> Option<RelationshipPropertiesWalker<'a>> {
        self.get().properties.map(|id| self.walk(id))
    }

    /// Edge properties, if any.
    pub fn attributes(self) -> impl Iterator<Item = AttributeWalker<'a>> + 'a {
        self.properties().into_iter().flat_map(|properties| properties.attributes())
    }

    pub fn find_attribute(self, name: &str) -> Option<AttributeWalker<'a>> {
        self.properties().and_then(|properties| properties.find_attribute(name))
    }

    pub fn authentication(self) -> Option<&'a AuthenticationRule> {
        self.get().authentication.as_ref()
    }

    /// The interface declaration this relationship implements, if any.
    pub fn declaration(self) -> Option<RelationshipDeclarationWalker<'a>> {
        self.get().declaration.map(|id| self.walk(id))
    }

    pub fn names(self) -> &'a RelationshipNames {
        &self.get().names
    }
}

/// A named set of edge properties, shared by relationships.
pub type RelationshipPropertiesWalker<'a> = Walker<'a, RelationshipPropertiesId>;

impl<'a> RelationshipPropertiesWalker<'a> {
    pub fn name(self) -> &'a str {
        &self.get().name
    }

    pub fn attributes(self) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a {
        self.get().attributes.iter().map(move |id| self.walk(id))
    }

    pub fn find_attribute(self, name: &str) -> Option<AttributeWalker<'a>> {
        self.attributes().find(|attribute| attribute.name() == name)
    }
}
