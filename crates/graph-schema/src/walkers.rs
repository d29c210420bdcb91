mod attribute;
mod concrete;
mod entity;
mod interface;
mod relationship;
mod relationship_declaration;
mod union;

pub use attribute::AttributeWalker;
pub use concrete::ConcreteEntityWalker;
pub use entity::EntityWalker;
pub use interface::InterfaceEntityWalker;
pub use relationship::{RelationshipPropertiesWalker, RelationshipWalker};
pub use relationship_declaration::RelationshipDeclarationWalker;
pub use union::UnionEntityWalker;

use std::ops::Index;

use crate::{AttributeId, Schema};

/// A view over one record of the schema. The `Id` must point to an object in the schema.
#[derive(Clone, Copy)]
pub struct Walker<'a, Id> {
    pub(crate) id: Id,
    pub(crate) schema: &'a Schema,
}

impl<Id> PartialEq for Walker<'_, Id>
where
    Id: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.schema, other.schema)
    }
}

impl<Id: Eq> Eq for Walker<'_, Id> {}

impl<Id: std::fmt::Debug> std::fmt::Debug for Walker<'_, Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.id.fmt(f)
    }
}

impl<'a, Id> Walker<'a, Id>
where
    Id: Copy,
{
    pub fn id(self) -> Id {
        self.id
    }

    pub fn schema(self) -> &'a Schema {
        self.schema
    }

    pub(crate) fn walk<OtherId>(self, id: OtherId) -> Walker<'a, OtherId> {
        self.schema.walk(id)
    }

    fn get(self) -> &'a <Schema as Index<Id>>::Output
    where
        Schema: Index<Id>,
    {
        &self.schema[self.id]
    }

    fn attributes_of(self, ids: &'a [AttributeId]) -> impl ExactSizeIterator<Item = AttributeWalker<'a>> + 'a
    where
        Id: 'a,
    {
        ids.iter().map(move |id| self.walk(*id))
    }
}
