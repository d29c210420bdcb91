use std::num::NonZeroU32;

use crate::{
    AttributeRecord, ConcreteEntityRecord, InterfaceEntityRecord, RelationshipDeclarationRecord,
    RelationshipPropertiesRecord, RelationshipRecord, Schema, UnionEntityRecord,
};

/// Declares arena ids stored as `NonZeroU32` (so `Option<Id>` stays four bytes) and the `Index`
/// impls resolving them against the schema vectors.
macro_rules! schema_ids {
    ($($name:ident => $field:ident: $record:ty,)*) => {
        $(
            #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(NonZeroU32);

            impl From<usize> for $name {
                fn from(value: usize) -> Self {
                    let value = u32::try_from(value + 1).ok().and_then(NonZeroU32::new);

                    match value {
                        Some(value) => Self(value),
                        None => unreachable!("schema arenas hold fewer than u32::MAX records"),
                    }
                }
            }

            impl From<$name> for usize {
                fn from(id: $name) -> Self {
                    (id.0.get() - 1) as usize
                }
            }

            impl std::fmt::Debug for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    let name = stringify!($name);
                    write!(f, "{}#{}", name.strip_suffix("Id").unwrap_or(name), usize::from(*self))
                }
            }

            impl std::ops::Index<$name> for Schema {
                type Output = $record;

                fn index(&self, index: $name) -> &Self::Output {
                    &self.$field[usize::from(index)]
                }
            }

            impl std::ops::Index<IdRange<$name>> for Schema {
                type Output = [$record];

                fn index(&self, range: IdRange<$name>) -> &Self::Output {
                    &self.$field[usize::from(range.start)..usize::from(range.end)]
                }
            }
        )*
    };
}

schema_ids! {
    ConcreteEntityId => concrete_entities: ConcreteEntityRecord,
    InterfaceEntityId => interface_entities: InterfaceEntityRecord,
    UnionEntityId => union_entities: UnionEntityRecord,
    AttributeId => attributes: AttributeRecord,
    RelationshipId => relationships: RelationshipRecord,
    RelationshipDeclarationId => relationship_declarations: RelationshipDeclarationRecord,
    RelationshipPropertiesId => relationship_properties: RelationshipPropertiesRecord,
}

/// Every entity variant the compiler understands. Matching on it is exhaustive by construction, so
/// a new variant has to be handled at every consumption site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    Concrete(ConcreteEntityId),
    Interface(InterfaceEntityId),
    Union(UnionEntityId),
}

impl From<ConcreteEntityId> for EntityId {
    fn from(id: ConcreteEntityId) -> Self {
        Self::Concrete(id)
    }
}

impl From<InterfaceEntityId> for EntityId {
    fn from(id: InterfaceEntityId) -> Self {
        Self::Interface(id)
    }
}

impl From<UnionEntityId> for EntityId {
    fn from(id: UnionEntityId) -> Self {
        Self::Union(id)
    }
}

/// A half-open range of consecutive ids. Records owned by the same parent are pushed together,
/// so the parent only keeps the bounds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdRange<Id> {
    pub start: Id,
    pub end: Id,
}

impl<Id> IdRange<Id>
where
    Id: From<usize> + Copy,
    usize: From<Id>,
{
    pub fn empty() -> Self {
        Self {
            start: Id::from(0),
            end: Id::from(0),
        }
    }

    pub fn len(&self) -> usize {
        usize::from(self.end) - usize::from(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(self) -> impl ExactSizeIterator<Item = Id> + DoubleEndedIterator {
        (usize::from(self.start)..usize::from(self.end)).map(Id::from)
    }
}

impl<Id: std::fmt::Debug> std::fmt::Debug for IdRange<Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}
