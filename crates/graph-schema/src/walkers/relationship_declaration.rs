use super::{
    AttributeWalker, ConcreteEntityWalker, EntityWalker, InterfaceEntityWalker, RelationshipPropertiesWalker,
    RelationshipWalker, Walker,
};
use crate::{ConcreteEntityId, RelationshipDeclarationId, RelationshipNames};

/// The abstract counterpart of a relationship on an interface. It has no edge type of its own,
/// only the concrete relationships implementing it.
pub type RelationshipDeclarationWalker<'a> = Walker<'a, RelationshipDeclarationId>;

impl<'a> RelationshipDeclarationWalker<'a> {
    pub fn name(self) -> &'a str {
        &self.get().name
    }

    pub fn interface(self) -> InterfaceEntityWalker<'a> {
        self.walk(self.get().interface)
    }

    pub fn target(self) -> EntityWalker<'a> {
        self.schema.entity(self.get().target)
    }

    pub fn is_list(self) -> bool {
        self.get().list
    }

    pub fn properties(self) -> Option<RelationshipPropertiesWalker<'a>> {
        self.get().properties.map(|id| self.walk(id))
    }

    pub fn find_attribute(self, name: &str) -> Option<AttributeWalker<'a>> {
        self.properties().and_then(|properties| properties.find_attribute(name))
    }

    pub fn implementations(self) -> impl ExactSizeIterator<Item = RelationshipWalker<'a>> + 'a {
        self.get().implementations.iter().map(move |id| self.walk(*id))
    }

    /// The relationship implementing this declaration on the given node.
    pub fn implementation_for(self, entity: ConcreteEntityId) -> Option<RelationshipWalker<'a>> {
        self.implementations()
            .find(|relationship| relationship.source().id() == entity)
    }

    /// Names are derived from the first interface declaring a field of this name, when several
    /// interfaces redeclare it.
    pub fn first_declaring_interface(self) -> InterfaceEntityWalker<'a> {
        self.walk(self.get().first_declaring_interface)
    }

    pub fn implementors(self) -> impl Iterator<Item = ConcreteEntityWalker<'a>> + 'a {
        self.implementations().map(RelationshipWalker::source)
    }

    pub fn names(self) -> &'a RelationshipNames {
        &self.get().names
    }
}
