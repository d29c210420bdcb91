use super::{AttributeWalker, ConcreteEntityWalker, RelationshipDeclarationWalker, Walker};
use crate::{AuthenticationRule, AuthorizationRule, EntityNames, InterfaceEntityId, Limit};

/// An abstract entity, implemented by one or more nodes.
pub type InterfaceEntityWalker<'a> = Walker<'a, InterfaceEntityId>;

impl<'a> InterfaceEntityWalker<'a> {
    pub fn name(self) -> &'a str {
        &self.get().name
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

    pub fn sortable_attributes(self) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a {
        self.attributes_of(&self.get().capability_index.sortable)
    }

    pub fn aggregable_attributes(self) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a {
        self.attributes_of(&self.get().capability_index.aggregable)
    }

    /// The abstract relationships of this interface.
    pub fn declarations(self) -> impl ExactSizeIterator<Item = RelationshipDeclarationWalker<'a>> + 'a {
        self.get().declarations.iter().map(move |id| self.walk(id))
    }

    pub fn find_declaration(self, name: &str) -> Option<RelationshipDeclarationWalker<'a>> {
        self.declarations().find(|declaration| declaration.name() == name)
    }

    /// Nodes implementing this interface, in declaration order.
    pub fn implementors(self) -> impl ExactSizeIterator<Item = ConcreteEntityWalker<'a>> + 'a {
        self.get().implementors.iter().map(move |id| self.walk(*id))
    }

    pub fn authorization(self) -> &'a [AuthorizationRule] {
        &self.get().authorization
    }

    pub fn authentication(self) -> Option<&'a AuthenticationRule> {
        self.get().authentication.as_ref()
    }

    pub fn limit(self) -> Option<Limit> {
        self.get().limit
    }
}
